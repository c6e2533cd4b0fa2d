//! In-memory wiring for the record service.

use std::sync::Arc;

use crate::collaborators::{FieldRegistry, InMemoryActivityLog, InMemoryConformities, InMemoryInternalNotes};
use crate::config::RecordServiceConfig;
use crate::service::{Collaborators, RecordService};
use crate::storage::InMemoryRecordStore;

/// Convenience bundle of in-memory store and collaborators.
///
/// The handles are shared with every service built from the bundle, so tests
/// and tools can inspect logged events, notes and conformities afterwards.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    /// Record store.
    pub records: Arc<InMemoryRecordStore>,
    /// Custom field definitions.
    pub fields: Arc<FieldRegistry>,
    /// Activity log.
    pub activity: Arc<InMemoryActivityLog>,
    /// Internal notes.
    pub notes: Arc<InMemoryInternalNotes>,
    /// Conformity graph.
    pub conformities: Arc<InMemoryConformities>,
}

impl InMemoryBackend {
    /// Create a new bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bundle around an existing record store.
    #[must_use]
    pub fn with_records(records: InMemoryRecordStore) -> Self {
        Self {
            records: Arc::new(records),
            ..Self::default()
        }
    }

    /// Collaborator handles for a [`RecordService`].
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            custom_fields: self.fields.clone(),
            activity_log: self.activity.clone(),
            notes: self.notes.clone(),
            conformities: self.conformities.clone(),
        }
    }

    /// Build a service over this bundle.
    #[must_use]
    pub fn service(&self, config: RecordServiceConfig) -> RecordService {
        RecordService::new(self.records.clone(), self.collaborators(), config)
    }
}
