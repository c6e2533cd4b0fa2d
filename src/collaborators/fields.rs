//! Custom field definitions and value sanitizing.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collaborators::{CollaboratorError, CustomFieldsNormalizer};
use crate::record::CustomFieldEntry;

const REGEX_CACHE_MAX: usize = 256;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static REGEX_CACHE: OnceLock<RwLock<HashMap<String, regex::Regex>>> = OnceLock::new();

fn invalid(field_id: &str, reason: impl Into<String>) -> CollaboratorError {
    CollaboratorError::Validation {
        field_id: field_id.to_string(),
        reason: reason.into(),
    }
}

fn cached_regex(pattern: &str) -> Result<regex::Regex, String> {
    let cache = REGEX_CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    {
        let guard = cache.read().map_err(|_| "regex cache lock poisoned".to_string())?;
        if let Some(re) = guard.get(pattern) {
            return Ok(re.clone());
        }
    }

    let compiled =
        regex::Regex::new(pattern).map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;

    let mut guard = cache.write().map_err(|_| "regex cache lock poisoned".to_string())?;
    if guard.len() >= REGEX_CACHE_MAX {
        guard.clear();
    }
    guard
        .entry(pattern.to_string())
        .or_insert_with(|| compiled.clone());
    Ok(compiled)
}

/// Kind of value a custom field accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pattern", rename_all = "lowercase")]
pub enum FieldKind {
    /// Any string (numbers are stringified).
    Text,
    /// A number, or a string that parses as one.
    Number,
    /// An RFC 3339 timestamp or a `YYYY-MM-DD` date.
    Date,
    /// An email address.
    Email,
    /// A string matching the given regular expression.
    Pattern(String),
}

/// A custom field definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field ID, as used in `customFieldsData` entries.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Accepted value kind.
    pub kind: FieldKind,
}

impl FieldDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    /// Validates `value` and returns its cleaned form.
    fn sanitize(&self, value: Value) -> Result<Value, CollaboratorError> {
        match &self.kind {
            FieldKind::Text => match value {
                Value::String(s) => Ok(Value::String(s.trim().to_string())),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                Value::Bool(b) => Ok(Value::String(b.to_string())),
                _ => Err(invalid(&self.id, "expected text")),
            },
            FieldKind::Number => match value {
                Value::Number(n) => Ok(Value::Number(n)),
                Value::String(s) => {
                    let trimmed = s.trim();
                    if let Ok(i) = trimmed.parse::<i64>() {
                        return Ok(Value::from(i));
                    }
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(|| invalid(&self.id, format!("'{trimmed}' is not a number")))
                }
                _ => Err(invalid(&self.id, "expected a number")),
            },
            FieldKind::Date => {
                let Value::String(s) = value else {
                    return Err(invalid(&self.id, "expected a date string"));
                };
                let trimmed = s.trim();
                if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
                    return Ok(Value::String(ts.to_rfc3339()));
                }
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                    .map_err(|_| invalid(&self.id, format!("'{trimmed}' is not a date")))
            }
            FieldKind::Email => {
                let Value::String(s) = value else {
                    return Err(invalid(&self.id, "expected an email string"));
                };
                let trimmed = s.trim();
                let re = cached_regex(EMAIL_PATTERN).map_err(|reason| invalid(&self.id, reason))?;
                if re.is_match(trimmed) {
                    Ok(Value::String(trimmed.to_string()))
                } else {
                    Err(invalid(&self.id, format!("'{trimmed}' is not an email address")))
                }
            }
            FieldKind::Pattern(pattern) => {
                let Value::String(s) = value else {
                    return Err(invalid(&self.id, "expected a string"));
                };
                let re = cached_regex(pattern).map_err(|reason| invalid(&self.id, reason))?;
                if re.is_match(&s) {
                    Ok(Value::String(s))
                } else {
                    Err(invalid(&self.id, format!("'{s}' does not match {pattern}")))
                }
            }
        }
    }
}

/// Registry of custom field definitions.
///
/// Values of registered fields are validated and cleaned; entries for
/// unregistered fields pass through untouched. Entries with a `null` value are
/// dropped.
#[derive(Debug, Default)]
pub struct FieldRegistry {
    definitions: RwLock<HashMap<String, FieldDefinition>>,
}

impl FieldRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a definition.
    ///
    /// # Errors
    /// - `Failed`: if the lock is poisoned
    pub fn register(&self, definition: FieldDefinition) -> Result<(), CollaboratorError> {
        self.definitions
            .write()
            .map_err(|_| CollaboratorError::failed("custom fields", "poisoned lock"))?
            .insert(definition.id.clone(), definition);
        Ok(())
    }
}

impl CustomFieldsNormalizer for FieldRegistry {
    fn prepare(&self, entries: Vec<CustomFieldEntry>) -> Result<Vec<CustomFieldEntry>, CollaboratorError> {
        let definitions = self
            .definitions
            .read()
            .map_err(|_| CollaboratorError::failed("custom fields", "poisoned lock"))?;

        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.field_id.trim().is_empty() {
                return Err(invalid(&entry.field_id, "field id cannot be empty"));
            }
            if entry.value.is_null() {
                continue;
            }
            let value = match definitions.get(&entry.field_id) {
                Some(definition) => definition.sanitize(entry.value)?,
                None => entry.value,
            };
            out.push(CustomFieldEntry {
                field_id: entry.field_id,
                value,
            });
        }
        Ok(out)
    }
}
