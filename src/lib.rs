//! # crm-records - Company record workflows
//!
//! This crate implements the record lifecycle of a CRM's company-like
//! records on top of a pluggable document store: uniqueness-checked create
//! and update, cascading remove, and merge (deduplication) of several records
//! into one.
//!
//! ## Core Concepts
//!
//! - **Record**: a company-like entity with unique name/code, set-valued
//!   names/emails/phones, tags, custom fields and a derived search text
//! - **Active record**: any record whose status is not `deleted`
//! - **Merge**: absorbing N source records into one new record and
//!   soft-deleting the sources
//! - **Collaborators**: activity log, internal notes, conformity graph and
//!   custom-field rules, all injected as traits
//!
//! ## Usage
//!
//! ```
//! use crm_records::{InMemoryBackend, RecordFields, RecordServiceConfig};
//!
//! let backend = InMemoryBackend::new();
//! let service = backend.service(RecordServiceConfig::default());
//!
//! let a = service.create(RecordFields::new().primary_name("Acme").tag("t1"), None)?;
//! let b = service.create(RecordFields::new().primary_name("ACME Inc").tag("t2"), None)?;
//!
//! let merged = service.merge(&[a.id, b.id], RecordFields::new().primary_name("Acme"))?;
//! assert_eq!(merged.tag_ids, vec!["t1", "t2"]);
//! assert_eq!(merged.merged_ids, Some(vec![a.id, b.id]));
//! # Ok::<(), crm_records::RecordError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod record;
pub mod service;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use collaborators::{
    ActivityEvent, ActivityLog, CollaboratorError, Conformity, ConformityGraph,
    CustomFieldsNormalizer, FieldDefinition, FieldKind, FieldRegistry, InMemoryActivityLog,
    InMemoryConformities, InMemoryInternalNotes, InternalNotes, Note,
};
pub use config::{RecordServiceConfig, RemovalMode};
pub use error::{DuplicateKind, ExecutionError, RecordError, RecordResult, ValidationError};
pub use record::{
    ContentType, CustomFieldEntry, Record, RecordFields, RecordId, RecordPatch, RecordStatus,
    TrackedDataEntry,
};
pub use service::{Actor, Collaborators, InMemoryBackend, RecordService, RemoveOutcome};
pub use storage::{with_active_filter, InMemoryRecordStore, RecordFilter, RecordStore, StorageError};
