//! Record query filters.

use crate::record::search_text::normalize_search_text;
use crate::record::{Record, RecordId, RecordStatus};

/// Conjunctive filter over records. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Only these IDs.
    pub ids: Option<Vec<RecordId>>,
    /// Never these IDs.
    pub exclude_ids: Vec<RecordId>,
    /// Exact primary name.
    pub primary_name: Option<String>,
    /// Exact code.
    pub code: Option<String>,
    /// Records carrying this tag.
    pub tag_id: Option<String>,
    /// Substring of the stored search text (normalized like the search text).
    pub search: Option<String>,
    /// Records not in this status.
    pub exclude_status: Option<RecordStatus>,
}

impl RecordFilter {
    /// Creates a filter that matches every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given IDs.
    #[must_use]
    pub fn ids(mut self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.ids = Some(ids.into_iter().collect());
        self
    }

    /// Exclude the given IDs.
    #[must_use]
    pub fn exclude_ids(mut self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.exclude_ids.extend(ids);
        self
    }

    /// Match an exact primary name.
    #[must_use]
    pub fn primary_name(mut self, name: impl Into<String>) -> Self {
        self.primary_name = Some(name.into());
        self
    }

    /// Match an exact code.
    #[must_use]
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Match records tagged with `tag_id`.
    #[must_use]
    pub fn tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tag_id = Some(tag_id.into());
        self
    }

    /// Match records whose search text contains `query`.
    #[must_use]
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    /// Returns true if `record` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.contains(&record.id) {
                return false;
            }
        }
        if self.exclude_ids.contains(&record.id) {
            return false;
        }
        if let Some(status) = self.exclude_status {
            if record.status == status {
                return false;
            }
        }
        if let Some(name) = &self.primary_name {
            if record.primary_name.as_ref() != Some(name) {
                return false;
            }
        }
        if let Some(code) = &self.code {
            if record.code.as_ref() != Some(code) {
                return false;
            }
        }
        if let Some(tag) = &self.tag_id {
            if !record.tag_ids.contains(tag) {
                return false;
            }
        }
        if let Some(query) = &self.search {
            let query = normalize_search_text(query, usize::MAX);
            if !record.search_text.contains(&query) {
                return false;
            }
        }
        true
    }
}

/// Composes the active-record condition (`status != deleted`) into `filter`.
///
/// Every read path that must not see deleted records calls this explicitly.
#[must_use]
pub fn with_active_filter(mut filter: RecordFilter) -> RecordFilter {
    filter.exclude_status = Some(RecordStatus::Deleted);
    filter
}
