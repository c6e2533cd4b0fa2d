//! Record layer modules.
//!
//! This module groups the record model, content types, list-field
//! normalization and search-text derivation.

pub mod content_type;
pub mod normalize;
#[allow(clippy::module_inception)]
pub mod record;
pub mod search_text;

pub use content_type::ContentType;
pub use record::{
    CustomFieldEntry, Record, RecordFields, RecordId, RecordPatch, RecordStatus, TrackedDataEntry,
};
