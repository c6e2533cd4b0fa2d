//! Service configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RecordError, RecordResult};
use crate::record::search_text::DEFAULT_SEARCH_TEXT_MAX_LEN;
use crate::record::ContentType;

/// How `remove` disposes of records once the cascade has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalMode {
    /// Mark records `deleted` and keep them for history.
    #[default]
    SoftDelete,
    /// Remove the rows from the store.
    HardDelete,
}

/// Configuration for [`RecordService`](crate::service::RecordService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordServiceConfig {
    /// Content type reported to collaborators.
    pub content_type: ContentType,
    /// Removal behaviour.
    pub removal_mode: RemovalMode,
    /// Maximum search text length, in characters.
    pub search_text_max_len: usize,
    /// Display name used when a record has no name, email or phone.
    pub unknown_name: String,
}

impl Default for RecordServiceConfig {
    fn default() -> Self {
        Self {
            content_type: ContentType::Company,
            removal_mode: RemovalMode::SoftDelete,
            search_text_max_len: DEFAULT_SEARCH_TEXT_MAX_LEN,
            unknown_name: "Unknown".to_string(),
        }
    }
}

impl RecordServiceConfig {
    /// Parse a JSON configuration; missing keys take their defaults.
    ///
    /// # Errors
    /// - `Internal`: if the JSON is malformed or a value is invalid
    pub fn from_json(raw: &str) -> RecordResult<Self> {
        serde_json::from_str(raw).map_err(|e| RecordError::internal(format!("invalid config: {e}")))
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    /// - `Internal`: if the file cannot be read or parsed
    pub fn load(path: &Path) -> RecordResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RecordError::internal(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}
