//! Record merge.
//!
//! Merging absorbs two or more source records into one new record. Sources are
//! processed in input order: each is loaded, its list fields accumulated, and
//! it is marked deleted before the next one is read. The replacement is then
//! created through the normal create path, and conformities and notes are
//! repointed to it.
//!
//! The sequence is not atomic. A failure after the first source has been
//! deleted leaves the deleted sources in place with no replacement; the error
//! is returned unchanged and a warning names the affected records.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{RecordError, RecordResult, ValidationError};
use crate::record::normalize::dedup_stable;
use crate::record::{CustomFieldEntry, Record, RecordFields, RecordId, RecordPatch, RecordStatus};
use crate::service::RecordService;

/// Union of the list fields of every source, in source order.
#[derive(Debug, Default)]
struct MergeAccumulator {
    scope_brand_ids: Vec<String>,
    custom_fields_data: Vec<CustomFieldEntry>,
    tag_ids: Vec<String>,
    names: Vec<String>,
    emails: Vec<String>,
    phones: Vec<String>,
}

impl MergeAccumulator {
    fn absorb(&mut self, source: Record) {
        self.scope_brand_ids.extend(source.scope_brand_ids);
        self.custom_fields_data.extend(source.custom_fields_data);
        self.tag_ids.extend(source.tag_ids);
        self.names.extend(source.names);
        self.emails.extend(source.emails);
        self.phones.extend(source.phones);
    }

    /// Overrides plus accumulated lists. Accumulated lists replace any lists
    /// given in the overrides; scope brands and custom fields are kept as
    /// concatenated, the rest are deduplicated.
    fn into_fields(self, overrides: RecordFields) -> RecordFields {
        RecordFields {
            scope_brand_ids: Some(self.scope_brand_ids),
            custom_fields_data: Some(self.custom_fields_data),
            tag_ids: Some(dedup_stable(self.tag_ids)),
            names: Some(dedup_stable(self.names)),
            emails: Some(dedup_stable(self.emails)),
            phones: Some(dedup_stable(self.phones)),
            ..overrides
        }
    }
}

fn validate_sources(ids: &[RecordId]) -> Result<(), ValidationError> {
    if ids.len() < 2 {
        return Err(ValidationError::TooFewMergeSources { count: ids.len() });
    }
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::RepeatedMergeSource { id: *id });
        }
    }
    Ok(())
}

impl RecordService {
    /// Merge `ids` into a new record built from `overrides` and the union of
    /// the sources' list fields.
    ///
    /// Returns the new record, whose `merged_ids` lists the sources.
    ///
    /// # Errors
    /// - `TooFewMergeSources`/`RepeatedMergeSource`: before any write
    /// - `DuplicateField`: if the override name or code is held by a
    ///   non-source active record
    /// - `NotFound`: if a source is missing or already deleted; earlier
    ///   sources stay deleted
    /// - any create, conformity or notes failure, with sources left deleted
    pub fn merge(&self, ids: &[RecordId], overrides: RecordFields) -> RecordResult<Record> {
        validate_sources(ids)?;
        self.check_duplication(&overrides, ids)?;

        let mut accumulator = MergeAccumulator::default();
        let mut deleted: Vec<RecordId> = Vec::with_capacity(ids.len());

        for &id in ids {
            let source = self
                .load_merge_source(id)
                .map_err(|err| self.partial_merge(&deleted, None, err))?;
            accumulator.absorb(source);

            self.records
                .update(id, &RecordPatch::status(RecordStatus::Deleted, Utc::now()))
                .map_err(|err| self.partial_merge(&deleted, None, err.into()))?;
            deleted.push(id);
            debug!(id = %id, "merge source absorbed");
        }

        let fields = accumulator.into_fields(overrides);
        let record = self
            .create_with_provenance(fields, None, ids.to_vec())
            .map_err(|err| self.partial_merge(&deleted, None, err))?;

        let content_type = &self.config.content_type;
        self.collaborators
            .conformities
            .change_conformity(content_type, record.id, ids)
            .map_err(|err| self.partial_merge(&deleted, Some(record.id), err.into()))?;
        self.collaborators
            .notes
            .change_owner(content_type, record.id, ids)
            .map_err(|err| self.partial_merge(&deleted, Some(record.id), err.into()))?;

        info!(
            id = %record.id,
            content_type = %content_type,
            sources = ids.len(),
            "records merged"
        );
        Ok(record)
    }

    /// Loads a source, treating deleted records as missing.
    fn load_merge_source(&self, id: RecordId) -> RecordResult<Record> {
        let record = self.get(id)?;
        if !record.is_active() {
            return Err(RecordError::not_found(id));
        }
        Ok(record)
    }

    fn partial_merge(
        &self,
        deleted: &[RecordId],
        merged: Option<RecordId>,
        err: RecordError,
    ) -> RecordError {
        if !deleted.is_empty() {
            let deleted: Vec<String> = deleted.iter().map(ToString::to_string).collect();
            warn!(
                content_type = %self.config.content_type,
                deleted_sources = ?deleted,
                merged = ?merged.map(|id| id.to_string()),
                error = %err,
                "merge aborted after sources were deleted"
            );
        }
        err
    }
}
