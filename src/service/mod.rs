//! Record workflows.
//!
//! [`RecordService`] applies create, update, remove and merge against a
//! pluggable [`RecordStore`] and the collaborator subsystems. Every store or
//! collaborator call is an independent step: nothing is locked across steps
//! and a failure aborts the operation without undoing earlier steps.

mod backend;
mod bulk;
mod merge;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collaborators::{ActivityEvent, ActivityLog, ConformityGraph, CustomFieldsNormalizer, InternalNotes};
use crate::config::{RecordServiceConfig, RemovalMode};
use crate::error::{DuplicateKind, RecordError, RecordResult, ValidationError};
use crate::record::normalize::fix_list_fields;
use crate::record::search_text::fill_search_text;
use crate::record::{Record, RecordFields, RecordId, RecordPatch, RecordStatus};
use crate::storage::{with_active_filter, RecordFilter, RecordStore, StorageError};

pub use backend::InMemoryBackend;

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// User identifier; becomes the owner of records the user creates.
    pub user_id: String,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Outcome of [`RecordService::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveOutcome {
    /// Number of records deleted (soft or hard).
    pub matched: usize,
}

/// Handles to the collaborator subsystems.
#[derive(Clone)]
pub struct Collaborators {
    /// Custom field validation.
    pub custom_fields: Arc<dyn CustomFieldsNormalizer>,
    /// Activity log sink.
    pub activity_log: Arc<dyn ActivityLog>,
    /// Internal notes.
    pub notes: Arc<dyn InternalNotes>,
    /// Conformity graph.
    pub conformities: Arc<dyn ConformityGraph>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Record workflow service.
#[derive(Clone)]
pub struct RecordService {
    records: Arc<dyn RecordStore>,
    collaborators: Collaborators,
    config: RecordServiceConfig,
}

impl RecordService {
    /// Create a new service over the given store and collaborators.
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        collaborators: Collaborators,
        config: RecordServiceConfig,
    ) -> Self {
        Self {
            records,
            collaborators,
            config,
        }
    }

    /// Get a reference to the record store.
    pub fn record_store(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    /// Get the active configuration.
    pub fn config(&self) -> &RecordServiceConfig {
        &self.config
    }

    /// Load a record by ID, whatever its status.
    ///
    /// # Errors
    /// - `NotFound`: if no record has this ID
    pub fn get(&self, id: RecordId) -> RecordResult<Record> {
        self.records
            .get(id)?
            .ok_or_else(|| RecordError::not_found(id))
    }

    /// Find non-deleted records matching `filter`.
    ///
    /// # Errors
    /// - `Storage`: if the store fails
    pub fn find_active(&self, filter: RecordFilter) -> RecordResult<Vec<Record>> {
        Ok(self.records.find(&with_active_filter(filter))?)
    }

    /// Human-readable name: primary name, else primary email, else primary
    /// phone, else the configured placeholder.
    #[must_use]
    pub fn display_name<'a>(&'a self, record: &'a Record) -> &'a str {
        [
            record.primary_name.as_deref(),
            record.primary_email.as_deref(),
            record.primary_phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or(self.config.unknown_name.as_str())
    }

    /// Fails if another active record already holds the candidate primary
    /// name or code. Records in `exclude` are ignored.
    ///
    /// # Errors
    /// - `DuplicateField`: on the first clash (name is checked before code)
    pub fn check_duplication(&self, fields: &RecordFields, exclude: &[RecordId]) -> RecordResult<()> {
        let base = RecordFilter::new().exclude_ids(exclude.iter().copied());

        if let Some(name) = non_empty(fields.primary_name.as_deref()) {
            if !self.find_active(base.clone().primary_name(name))?.is_empty() {
                return Err(ValidationError::DuplicateField {
                    kind: DuplicateKind::Name,
                    value: name.to_string(),
                }
                .into());
            }
        }

        if let Some(code) = non_empty(fields.code.as_deref()) {
            if !self.find_active(base.code(code))?.is_empty() {
                return Err(ValidationError::DuplicateField {
                    kind: DuplicateKind::Code,
                    value: code.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    fn search_text(&self, record: &Record) -> String {
        fill_search_text(&record.search_fields(), self.config.search_text_max_len)
    }

    /// Create a record.
    ///
    /// The owner defaults to `actor`. Singular `name`/`email`/`phone` inputs
    /// are folded into the lists, custom fields are sanitized, and a creation
    /// event is logged. The new record never has `merged_ids`; only
    /// [`merge`](Self::merge) sets it.
    ///
    /// # Errors
    /// - `DuplicateField`: if the primary name or code is taken
    /// - `CustomField`: if a custom field value is rejected
    /// - `Collaborator`/`Storage`: if a downstream call fails
    pub fn create(&self, fields: RecordFields, actor: Option<&Actor>) -> RecordResult<Record> {
        self.insert_record(fields, actor, None)
    }

    /// Create the replacement record of a merge, recording its sources.
    pub(crate) fn create_with_provenance(
        &self,
        fields: RecordFields,
        actor: Option<&Actor>,
        merged_ids: Vec<RecordId>,
    ) -> RecordResult<Record> {
        self.insert_record(fields, actor, Some(merged_ids))
    }

    fn insert_record(
        &self,
        mut fields: RecordFields,
        actor: Option<&Actor>,
        merged_ids: Option<Vec<RecordId>>,
    ) -> RecordResult<Record> {
        self.check_duplication(&fields, &[])?;

        if fields.owner_id.is_none() {
            fields.owner_id = actor.map(|a| a.user_id.clone());
        }

        let mut patch = fix_list_fields(fields, None);
        let entries = patch.custom_fields_data.take().unwrap_or_default();
        patch.custom_fields_data = Some(self.collaborators.custom_fields.prepare(entries)?);
        patch.merged_ids = merged_ids;

        let mut record = Record::from_patch(RecordId::new(), patch, Utc::now());
        record.search_text = self.search_text(&record);

        self.records.insert(record.clone())?;
        info!(
            id = %record.id,
            content_type = %self.config.content_type,
            "record created"
        );

        self.collaborators.activity_log.put(ActivityEvent::Create {
            content_type: self.config.content_type.clone(),
            record: Box::new(record.clone()),
        })?;

        Ok(record)
    }

    /// Update a record.
    ///
    /// Names, emails and phones are only ever added to, and `merged_ids` is
    /// never touched. The search text is
    /// derived from the stored record overlaid with the changes, and the
    /// freshly reloaded record is returned.
    ///
    /// # Errors
    /// - `DuplicateField`: if another active record holds the name or code
    /// - `NotFound`: if no record has this ID
    /// - `CustomField`: if a custom field value is rejected
    pub fn update(&self, id: RecordId, fields: RecordFields) -> RecordResult<Record> {
        self.check_duplication(&fields, &[id])?;

        let current = self.get(id)?;
        let mut patch = fix_list_fields(fields, Some(&current));

        if let Some(entries) = patch.custom_fields_data.take() {
            patch.custom_fields_data = Some(self.collaborators.custom_fields.prepare(entries)?);
        }

        let mut view = current;
        view.apply(&patch);
        patch.search_text = Some(self.search_text(&view));
        patch.modified_at = Some(Utc::now());

        self.records.update(id, &patch)?;
        debug!(id = %id, "record updated");

        self.get(id)
    }

    /// Remove records, cascading to the activity log, notes and conformities
    /// first.
    ///
    /// If a cascade step fails the records are left untouched.
    ///
    /// # Errors
    /// - `Collaborator`: if a cascade step fails
    /// - `Storage`: if the deletion fails
    pub fn remove(&self, ids: &[RecordId]) -> RecordResult<RemoveOutcome> {
        if ids.is_empty() {
            return Ok(RemoveOutcome { matched: 0 });
        }
        let content_type = &self.config.content_type;

        self.collaborators.activity_log.put(ActivityEvent::RemoveBulk {
            content_type: content_type.clone(),
            item_ids: ids.to_vec(),
        })?;
        self.collaborators.notes.remove_by_owner(content_type, ids)?;
        self.collaborators.conformities.remove_by_main(content_type, ids)?;

        let matched = match self.config.removal_mode {
            RemovalMode::HardDelete => self.records.delete_many(ids)?,
            RemovalMode::SoftDelete => {
                let now = Utc::now();
                let mut seen = HashSet::with_capacity(ids.len());
                let mut matched = 0usize;
                for &id in ids.iter().filter(|id| seen.insert(**id)) {
                    match self.records.update(id, &RecordPatch::status(RecordStatus::Deleted, now)) {
                        Ok(()) => matched += 1,
                        Err(StorageError::RecordNotFound(_)) => {}
                        Err(err) => return Err(err.into()),
                    }
                }
                matched
            }
        };

        info!(
            content_type = %content_type,
            requested = ids.len(),
            matched,
            mode = ?self.config.removal_mode,
            "records removed"
        );
        Ok(RemoveOutcome { matched })
    }
}
