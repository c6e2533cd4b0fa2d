//! Side-effect collaborators consumed by the record service.
//!
//! Each subsystem the service talks to (activity log, internal notes,
//! conformity graph, custom-field definitions) is a trait here. The service
//! holds them as `Arc<dyn Trait>` and awaits each call in order; it never
//! retries or compensates.

mod fields;
mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{ContentType, CustomFieldEntry, Record, RecordId};

pub use fields::{FieldDefinition, FieldKind, FieldRegistry};
pub use memory::{Conformity, InMemoryActivityLog, InMemoryConformities, InMemoryInternalNotes, Note};

/// Errors reported by collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The collaborator could not complete the call.
    #[error("{collaborator} failed: {message}")]
    Failed {
        collaborator: String,
        message: String,
    },

    /// A custom field value was rejected.
    #[error("Invalid value for custom field '{field_id}': {reason}")]
    Validation {
        field_id: String,
        reason: String,
    },
}

impl CollaboratorError {
    /// Creates a generic failure for `collaborator`.
    #[must_use]
    pub fn failed(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

/// An activity log event emitted by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActivityEvent {
    /// A record was created.
    Create {
        content_type: ContentType,
        record: Box<Record>,
    },
    /// Activity history for these records should be dropped.
    RemoveBulk {
        content_type: ContentType,
        item_ids: Vec<RecordId>,
    },
}

impl ActivityEvent {
    /// The content type the event is about.
    #[must_use]
    pub fn content_type(&self) -> &ContentType {
        match self {
            Self::Create { content_type, .. } | Self::RemoveBulk { content_type, .. } => {
                content_type
            }
        }
    }
}

/// Sanitizes custom field values against externally defined field rules.
pub trait CustomFieldsNormalizer: Send + Sync {
    /// Validate and clean `entries`.
    ///
    /// # Errors
    /// - `Validation`: if a value violates its field definition
    fn prepare(&self, entries: Vec<CustomFieldEntry>) -> Result<Vec<CustomFieldEntry>, CollaboratorError>;
}

/// Activity log sink.
pub trait ActivityLog: Send + Sync {
    /// Record `event`.
    fn put(&self, event: ActivityEvent) -> Result<(), CollaboratorError>;
}

/// Internal notes attached to records.
pub trait InternalNotes: Send + Sync {
    /// Remove every note owned by one of `owner_ids`.
    fn remove_by_owner(
        &self,
        content_type: &ContentType,
        owner_ids: &[RecordId],
    ) -> Result<(), CollaboratorError>;

    /// Move every note owned by one of `old_owner_ids` onto `new_owner_id`.
    fn change_owner(
        &self,
        content_type: &ContentType,
        new_owner_id: RecordId,
        old_owner_ids: &[RecordId],
    ) -> Result<(), CollaboratorError>;
}

/// Typed relationship graph between records of possibly different kinds.
pub trait ConformityGraph: Send + Sync {
    /// Remove relationships in which one of `main_ids` takes part.
    fn remove_by_main(
        &self,
        main_type: &ContentType,
        main_ids: &[RecordId],
    ) -> Result<(), CollaboratorError>;

    /// Repoint relationships from any of `old_ids` to `new_id`.
    fn change_conformity(
        &self,
        content_type: &ContentType,
        new_id: RecordId,
        old_ids: &[RecordId],
    ) -> Result<(), CollaboratorError>;
}
