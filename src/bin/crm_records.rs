//! crm-records command line tool
//!
//! Runs one record workflow against a JSON snapshot of the record store.

use std::path::PathBuf;
use std::process;

use crm_records::{
    InMemoryBackend, InMemoryRecordStore, RecordError, RecordFields, RecordFilter, RecordId,
    RecordServiceConfig,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Parsed command line.
struct Cli {
    /// Snapshot file holding the records
    data: PathBuf,
    /// Optional service configuration file
    config: Option<PathBuf>,
    /// Command name followed by its arguments
    command: Vec<String>,
}

fn usage() {
    println!("crm-records - company record workflows");
    println!();
    println!("USAGE:");
    println!("    crm-records --data <FILE> [--config <FILE>] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    create <FIELDS_JSON>             Create a record");
    println!("    update <ID> <FIELDS_JSON>        Update a record");
    println!("    remove <ID>...                   Remove records");
    println!("    merge <ID,ID,...> <FIELDS_JSON>  Merge records into a new one");
    println!("    get <ID>                         Print a record");
    println!("    list                             Print all active records");
    println!();
    println!("OPTIONS:");
    println!("    -d, --data <FILE>      Record snapshot (created if missing)");
    println!("    -c, --config <FILE>    Service configuration (JSON)");
    println!("    -h, --help             Print help information");
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    process::exit(1);
}

fn parse_args() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    let mut data = None;
    let mut config = None;
    let mut command = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data" | "-d" => {
                let Some(value) = args.get(i + 1) else {
                    fail("--data requires a value");
                };
                data = Some(PathBuf::from(value));
                i += 2;
            }
            "--config" | "-c" => {
                let Some(value) = args.get(i + 1) else {
                    fail("--config requires a value");
                };
                config = Some(PathBuf::from(value));
                i += 2;
            }
            "--help" | "-h" => {
                usage();
                process::exit(0);
            }
            arg if arg.starts_with('-') && command.is_empty() => {
                fail(format!("unknown argument: {arg}"));
            }
            _ => {
                command.extend_from_slice(&args[i..]);
                break;
            }
        }
    }

    let Some(data) = data else {
        fail("--data is required");
    };
    if command.is_empty() {
        fail("no command given (see --help)");
    }
    Cli {
        data,
        config,
        command,
    }
}

fn parse_id(raw: &str) -> Result<RecordId, RecordError> {
    raw.parse()
        .map_err(|_| RecordError::internal(format!("invalid record id: {raw}")))
}

fn parse_fields(raw: &str) -> Result<RecordFields, RecordError> {
    serde_json::from_str(raw).map_err(|e| RecordError::internal(format!("invalid fields: {e}")))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), RecordError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| RecordError::internal(format!("cannot encode output: {e}")))?;
    println!("{out}");
    Ok(())
}

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str, RecordError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| RecordError::internal(format!("missing {what}")))
}

/// Runs the command; returns whether the store was changed.
fn run(cli: &Cli, backend: &InMemoryBackend, config: RecordServiceConfig) -> Result<bool, RecordError> {
    let service = backend.service(config);
    let (name, args) = match cli.command.split_first() {
        Some((name, args)) => (name.as_str(), args),
        None => return Err(RecordError::internal("no command given")),
    };

    match name {
        "create" => {
            let fields = parse_fields(arg(args, 0, "fields")?)?;
            print_json(&service.create(fields, None)?)?;
            Ok(true)
        }
        "update" => {
            let id = parse_id(arg(args, 0, "record id")?)?;
            let fields = parse_fields(arg(args, 1, "fields")?)?;
            print_json(&service.update(id, fields)?)?;
            Ok(true)
        }
        "remove" => {
            let ids = args
                .iter()
                .map(|raw| parse_id(raw))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&service.remove(&ids)?)?;
            Ok(true)
        }
        "merge" => {
            let ids = arg(args, 0, "record ids")?
                .split(',')
                .filter(|raw| !raw.trim().is_empty())
                .map(parse_id)
                .collect::<Result<Vec<_>, _>>()?;
            let overrides = match args.get(1) {
                Some(raw) => parse_fields(raw)?,
                None => RecordFields::default(),
            };
            print_json(&service.merge(&ids, overrides)?)?;
            Ok(true)
        }
        "get" => {
            let id = parse_id(arg(args, 0, "record id")?)?;
            print_json(&service.get(id)?)?;
            Ok(false)
        }
        "list" => {
            print_json(&service.find_active(RecordFilter::new())?)?;
            Ok(false)
        }
        other => Err(RecordError::internal(format!("unknown command: {other}"))),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = parse_args();

    let config = match &cli.config {
        Some(path) => RecordServiceConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => RecordServiceConfig::default(),
    };
    let store = InMemoryRecordStore::load_json(&cli.data).unwrap_or_else(|e| fail(e));
    let backend = InMemoryBackend::with_records(store);

    match run(&cli, &backend, config) {
        Ok(true) => {
            if let Err(e) = backend.records.save_json(&cli.data) {
                fail(e);
            }
        }
        Ok(false) => {}
        Err(e) => fail(e),
    }
}
