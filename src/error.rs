//! Error types for record operations.
//!
//! All errors are strongly typed using thiserror, so callers can match on
//! the first violated condition (a duplicate name, a missing record, a
//! rejected custom field, a failing collaborator).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collaborators::CollaboratorError;
use crate::record::RecordId;
use crate::storage::StorageError;

/// Which unique field a duplicate was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKind {
    /// The primary name.
    Name,
    /// The business code.
    Code,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Code => write!(f, "code"),
        }
    }
}

/// Validation errors that occur before or while normalizing input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Duplicated {kind}: '{value}' is already used by an active record")]
    DuplicateField {
        kind: DuplicateKind,
        value: String,
    },

    #[error("Merge needs at least 2 source records, got {count}")]
    TooFewMergeSources {
        count: usize,
    },

    #[error("Record {id} appears more than once in the merge sources")]
    RepeatedMergeSource {
        id: RecordId,
    },

    #[error("Unknown field '{field}'")]
    UnknownField {
        field: String,
    },

    #[error("Invalid value for custom field '{field_id}': {reason}")]
    CustomField {
        field_id: String,
        reason: String,
    },
}

/// Execution errors that occur while talking to the record store.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Record not found: {id}")]
    NotFound {
        id: RecordId,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Top-level error type for record operations.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Collaborator error: {0}")]
    Collaborator(CollaboratorError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl From<CollaboratorError> for RecordError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Validation { field_id, reason } => {
                Self::Validation(ValidationError::CustomField { field_id, reason })
            }
            other @ CollaboratorError::Failed { .. } => Self::Collaborator(other),
        }
    }
}

impl From<StorageError> for RecordError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::RecordNotFound(id) => Self::not_found(id),
            other => Self::Execution(ExecutionError::Storage(other)),
        }
    }
}

impl RecordError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a not-found error for `id`.
    #[must_use]
    pub fn not_found(id: RecordId) -> Self {
        Self::Execution(ExecutionError::NotFound { id })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if a collaborator call failed.
    #[must_use]
    pub const fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if a record could not be found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::NotFound { .. }))
    }

    /// The unique field that was duplicated, if this is a duplicate error.
    #[must_use]
    pub const fn duplicate_kind(&self) -> Option<DuplicateKind> {
        match self {
            Self::Validation(ValidationError::DuplicateField { kind, .. }) => Some(*kind),
            _ => None,
        }
    }
}

/// Result type alias for record operations.
pub type RecordResult<T> = Result<T, RecordError>;
