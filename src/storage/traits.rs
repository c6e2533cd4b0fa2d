//! Abstract storage traits for records.
//!
//! These traits define the contract that record store backends must implement:
//! point lookups, filtered queries, inserts, partial updates and bulk deletes.
//! The service never assumes a particular backend.

use thiserror::Error;

use crate::record::{Record, RecordId, RecordPatch};
use crate::storage::filter::RecordFilter;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record not found.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    /// Key already exists, or a unique index rejected the write.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Reading or writing a snapshot failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage trait for record operations.
///
/// # Safety Considerations
/// - Each call is independent; callers get no isolation across calls
/// - Implementations should handle concurrent access safely
pub trait RecordStore: Send + Sync {
    /// Insert a new record. Returns error if the ID already exists.
    fn insert(&self, record: Record) -> Result<(), StorageError>;

    /// Get a record by ID, whatever its status.
    fn get(&self, id: RecordId) -> Result<Option<Record>, StorageError>;

    /// Find records matching `filter`.
    ///
    /// The filter is applied as given; active-only reads must compose
    /// [`with_active_filter`](crate::storage::with_active_filter) themselves.
    fn find(&self, filter: &RecordFilter) -> Result<Vec<Record>, StorageError>;

    /// Apply a partial update. Returns `RecordNotFound` if the ID is unknown.
    fn update(&self, id: RecordId, patch: &RecordPatch) -> Result<(), StorageError>;

    /// Permanently remove records. Unknown IDs are ignored.
    ///
    /// Returns the number of records removed.
    fn delete_many(&self, ids: &[RecordId]) -> Result<usize, StorageError>;
}
