//! Record types and identity.
//!
//! A [`Record`] is the mergeable company-like entity. Callers never build a
//! stored record field by field; they describe what they want with
//! [`RecordFields`], and the service normalizes that into a [`RecordPatch`]
//! which the store applies.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::search_text::SearchFields;

/// Globally unique, immutable record identifier.
///
/// # Examples
///
/// ```
/// use crm_records::RecordId;
///
/// let id = RecordId::new();
/// assert!(!id.is_nil());
/// assert_eq!(id.to_string().parse::<RecordId>().unwrap(), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Creates a new random record ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Creates a nil record ID (for testing or sentinel values).
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RecordId> for Uuid {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Lifecycle status of a record.
///
/// Deleted records are kept for history but are invisible to active queries
/// and to duplicate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Visible to active queries.
    #[default]
    Active,
    /// Soft-deleted (removed or merged away).
    Deleted,
}

impl RecordStatus {
    /// Returns true for [`RecordStatus::Active`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// A single custom field value attached to a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldEntry {
    /// Identifier of the field definition.
    pub field_id: String,
    /// Raw value as supplied by the caller.
    pub value: serde_json::Value,
}

impl CustomFieldEntry {
    /// Creates a custom field entry.
    #[must_use]
    pub fn new(field_id: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field_id: field_id.into(),
            value: value.into(),
        }
    }
}

/// Extra data pushed by an integration, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDataEntry {
    /// Field name as reported by the integration.
    pub field: String,
    /// Reported value.
    pub value: serde_json::Value,
}

impl TrackedDataEntry {
    /// Creates a tracked data entry.
    #[must_use]
    pub fn new(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A company-like CRM record.
///
/// # Examples
///
/// ```
/// use crm_records::{Record, RecordStatus};
///
/// let record = Record::new();
/// assert_eq!(record.status, RecordStatus::Active);
/// assert!(record.names.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Globally unique identifier.
    pub id: RecordId,

    /// Active or deleted.
    #[serde(default)]
    pub status: RecordStatus,

    /// Display name; unique among active records when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_name: Option<String>,

    /// Business code; unique among active records when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Preferred email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_email: Option<String>,

    /// Preferred phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<String>,

    /// All known names.
    #[serde(default)]
    pub names: Vec<String>,

    /// All known email addresses.
    #[serde(default)]
    pub emails: Vec<String>,

    /// All known phone numbers.
    #[serde(default)]
    pub phones: Vec<String>,

    /// Owning user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    /// Brand scopes the record is visible in.
    #[serde(default)]
    pub scope_brand_ids: Vec<String>,

    /// Custom field values. Later entries may shadow earlier ones for the same field.
    #[serde(default)]
    pub custom_fields_data: Vec<CustomFieldEntry>,

    /// Integration-supplied data that does not map onto a built-in field.
    #[serde(default)]
    pub tracked_data: Vec<TrackedDataEntry>,

    /// Attached tags.
    #[serde(default)]
    pub tag_ids: Vec<String>,

    /// Records absorbed into this one by a merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_ids: Option<Vec<RecordId>>,

    /// Company website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Industry label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    /// Subscription plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,

    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Arbitrary metadata key-values. Not part of the search text.
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// Denormalized free-text search string.
    #[serde(default)]
    pub search_text: String,

    /// When the record was created.
    pub created_at: DateTime<Utc>,

    /// When the record was last written.
    pub modified_at: DateTime<Utc>,
}

impl Record {
    /// Built-in field names, as serialized.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "id",
        "status",
        "primaryName",
        "code",
        "primaryEmail",
        "primaryPhone",
        "names",
        "emails",
        "phones",
        "ownerId",
        "scopeBrandIds",
        "customFieldsData",
        "trackedData",
        "tagIds",
        "mergedIds",
        "website",
        "industry",
        "plan",
        "description",
        "metadata",
        "searchText",
        "createdAt",
        "modifiedAt",
    ];

    /// Creates an empty active record with a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(RecordId::new())
    }

    /// Creates an empty active record with a specific ID.
    ///
    /// Useful for imports and tests where the ID must be known up front.
    #[must_use]
    pub fn with_id(id: RecordId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: RecordStatus::Active,
            primary_name: None,
            code: None,
            primary_email: None,
            primary_phone: None,
            names: Vec::new(),
            emails: Vec::new(),
            phones: Vec::new(),
            owner_id: None,
            scope_brand_ids: Vec::new(),
            custom_fields_data: Vec::new(),
            tracked_data: Vec::new(),
            tag_ids: Vec::new(),
            merged_ids: None,
            website: None,
            industry: None,
            plan: None,
            description: None,
            metadata: serde_json::Value::Null,
            search_text: String::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Builds a new record from a normalized patch, stamping both timestamps with `now`.
    #[must_use]
    pub fn from_patch(id: RecordId, patch: RecordPatch, now: DateTime<Utc>) -> Self {
        let mut record = Self::with_id(id);
        record.apply(&patch);
        record.created_at = now;
        record.modified_at = patch.modified_at.unwrap_or(now);
        record
    }

    /// Returns true if the record is not deleted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns true if `name` is a built-in field name.
    #[must_use]
    pub fn is_field_name(name: &str) -> bool {
        Self::FIELD_NAMES.contains(&name)
    }

    /// Overlays every field present in `patch` onto this record.
    pub fn apply(&mut self, patch: &RecordPatch) {
        fn set<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }

        set(&mut self.status, patch.status.as_ref());
        if let Some(v) = &patch.primary_name {
            self.primary_name = Some(v.clone());
        }
        if let Some(v) = &patch.code {
            self.code = Some(v.clone());
        }
        if let Some(v) = &patch.primary_email {
            self.primary_email = Some(v.clone());
        }
        if let Some(v) = &patch.primary_phone {
            self.primary_phone = Some(v.clone());
        }
        set(&mut self.names, patch.names.as_ref());
        set(&mut self.emails, patch.emails.as_ref());
        set(&mut self.phones, patch.phones.as_ref());
        if let Some(v) = &patch.owner_id {
            self.owner_id = Some(v.clone());
        }
        set(&mut self.scope_brand_ids, patch.scope_brand_ids.as_ref());
        set(&mut self.custom_fields_data, patch.custom_fields_data.as_ref());
        set(&mut self.tracked_data, patch.tracked_data.as_ref());
        set(&mut self.tag_ids, patch.tag_ids.as_ref());
        if let Some(v) = &patch.merged_ids {
            self.merged_ids = Some(v.clone());
        }
        if let Some(v) = &patch.website {
            self.website = Some(v.clone());
        }
        if let Some(v) = &patch.industry {
            self.industry = Some(v.clone());
        }
        if let Some(v) = &patch.plan {
            self.plan = Some(v.clone());
        }
        if let Some(v) = &patch.description {
            self.description = Some(v.clone());
        }
        set(&mut self.metadata, patch.metadata.as_ref());
        set(&mut self.search_text, patch.search_text.as_ref());
        set(&mut self.modified_at, patch.modified_at.as_ref());
    }

    /// Borrows the fields that contribute to the search text.
    #[must_use]
    pub fn search_fields(&self) -> SearchFields<'_> {
        SearchFields::from(self)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// Candidate field values supplied by a caller.
///
/// Used as the input of create, update, merge overrides and bulk import. Every
/// field is optional. `name`, `email` and `phone` are convenience inputs: they
/// are folded into the plural lists during normalization and never stored.
///
/// # Examples
///
/// ```
/// use crm_records::RecordFields;
///
/// let fields = RecordFields::new()
///     .primary_name("Acme")
///     .email("a@acme.com")
///     .tag("t1");
/// assert_eq!(fields.primary_name.as_deref(), Some("Acme"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordFields {
    /// Candidate primary name; checked for uniqueness.
    pub primary_name: Option<String>,
    /// Candidate business code; checked for uniqueness.
    pub code: Option<String>,
    /// Convenience single name, folded into `names`. Unlike `email` and
    /// `phone` it does not set the primary value; use `primary_name` for that.
    pub name: Option<String>,
    /// Convenience single email, folded into `emails` and `primary_email`.
    pub email: Option<String>,
    /// Convenience single phone, folded into `phones` and `primary_phone`.
    pub phone: Option<String>,
    /// Preferred email, unless `email` overrides it.
    pub primary_email: Option<String>,
    /// Preferred phone, unless `phone` overrides it.
    pub primary_phone: Option<String>,
    /// Names to add.
    pub names: Option<Vec<String>>,
    /// Emails to add.
    pub emails: Option<Vec<String>>,
    /// Phones to add.
    pub phones: Option<Vec<String>>,
    /// Owning user; defaults to the acting user on create.
    pub owner_id: Option<String>,
    /// Brand scopes (replaces the stored list).
    pub scope_brand_ids: Option<Vec<String>>,
    /// Custom field values, sanitized before storage.
    pub custom_fields_data: Option<Vec<CustomFieldEntry>>,
    /// Tracked key-values; built-in field names are dropped.
    pub tracked_data: Option<Vec<TrackedDataEntry>>,
    /// Tags (replaces the stored list).
    pub tag_ids: Option<Vec<String>>,
    /// Company website.
    pub website: Option<String>,
    /// Industry label.
    pub industry: Option<String>,
    /// Subscription plan.
    pub plan: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Arbitrary metadata (replaces the stored value).
    pub metadata: Option<serde_json::Value>,
}

impl RecordFields {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the primary name.
    #[must_use]
    pub fn primary_name(mut self, value: impl Into<String>) -> Self {
        self.primary_name = Some(value.into());
        self
    }

    /// Set the business code.
    #[must_use]
    pub fn code(mut self, value: impl Into<String>) -> Self {
        self.code = Some(value.into());
        self
    }

    /// Set the convenience single name.
    ///
    /// The name is only added to `names`; it never becomes `primary_name`.
    #[must_use]
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    /// Set the convenience single email.
    #[must_use]
    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    /// Set the convenience single phone.
    #[must_use]
    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }

    /// Replace the names list.
    #[must_use]
    pub fn names<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the emails list.
    #[must_use]
    pub fn emails<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the phones list.
    #[must_use]
    pub fn phones<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phones = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Add a tag.
    #[must_use]
    pub fn tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tag_ids.get_or_insert_with(Vec::new).push(tag_id.into());
        self
    }

    /// Add a brand scope.
    #[must_use]
    pub fn scope_brand(mut self, brand_id: impl Into<String>) -> Self {
        self.scope_brand_ids
            .get_or_insert_with(Vec::new)
            .push(brand_id.into());
        self
    }

    /// Add a custom field value.
    #[must_use]
    pub fn custom_field(
        mut self,
        field_id: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.custom_fields_data
            .get_or_insert_with(Vec::new)
            .push(CustomFieldEntry::new(field_id, value));
        self
    }

    /// Add a tracked data entry.
    #[must_use]
    pub fn tracked(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.tracked_data
            .get_or_insert_with(Vec::new)
            .push(TrackedDataEntry::new(field, value));
        self
    }

    /// Set the owner.
    #[must_use]
    pub fn owner_id(mut self, value: impl Into<String>) -> Self {
        self.owner_id = Some(value.into());
        self
    }

    /// Set the website.
    #[must_use]
    pub fn website(mut self, value: impl Into<String>) -> Self {
        self.website = Some(value.into());
        self
    }

    /// Set the industry.
    #[must_use]
    pub fn industry(mut self, value: impl Into<String>) -> Self {
        self.industry = Some(value.into());
        self
    }

    /// Set the plan.
    #[must_use]
    pub fn plan(mut self, value: impl Into<String>) -> Self {
        self.plan = Some(value.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    /// Set free-form metadata.
    #[must_use]
    pub fn metadata(mut self, value: serde_json::Value) -> Self {
        self.metadata = Some(value);
        self
    }
}

/// A normalized partial write.
///
/// Present fields replace the stored value; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordPatch {
    /// New status.
    pub status: Option<RecordStatus>,
    /// New primary name.
    pub primary_name: Option<String>,
    /// New code.
    pub code: Option<String>,
    /// New primary email.
    pub primary_email: Option<String>,
    /// New primary phone.
    pub primary_phone: Option<String>,
    /// Full names list.
    pub names: Option<Vec<String>>,
    /// Full emails list.
    pub emails: Option<Vec<String>>,
    /// Full phones list.
    pub phones: Option<Vec<String>>,
    /// New owner.
    pub owner_id: Option<String>,
    /// Full brand scope list.
    pub scope_brand_ids: Option<Vec<String>>,
    /// Sanitized custom field values.
    pub custom_fields_data: Option<Vec<CustomFieldEntry>>,
    /// Filtered tracked data.
    pub tracked_data: Option<Vec<TrackedDataEntry>>,
    /// Full tag list.
    pub tag_ids: Option<Vec<String>>,
    /// Merge provenance; only set by merge.
    pub merged_ids: Option<Vec<RecordId>>,
    /// New website.
    pub website: Option<String>,
    /// New industry.
    pub industry: Option<String>,
    /// New plan.
    pub plan: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New metadata.
    pub metadata: Option<serde_json::Value>,
    /// Recomputed search text.
    pub search_text: Option<String>,
    /// Write timestamp.
    pub modified_at: Option<DateTime<Utc>>,
}

impl RecordPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: RecordStatus, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            modified_at: Some(now),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_creation() {
        let id1 = RecordId::new();
        let id2 = RecordId::new();
        assert_ne!(id1, id2);
        assert!(!id1.is_nil());
        assert!(RecordId::nil().is_nil());
    }

    #[test]
    fn test_record_id_parse() {
        let id = RecordId::new();
        let parsed: RecordId = format!(" {id} ").parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_value(RecordStatus::Deleted).unwrap();
        assert_eq!(json, serde_json::Value::String("deleted".to_string()));
        assert!(RecordStatus::Active.is_active());
        assert!(!RecordStatus::Deleted.is_active());
    }

    #[test]
    fn test_record_serializes_camel_case_without_empty_options() {
        let mut record = Record::new();
        record.primary_name = Some("Acme".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["primaryName"], "Acme");
        assert!(json.get("primaryEmail").is_none());
        assert!(json.get("createdAt").is_some());

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_field_names_match_serialized_keys() {
        let mut record = Record::new();
        record.primary_name = Some("n".into());
        record.code = Some("c".into());
        record.primary_email = Some("e".into());
        record.primary_phone = Some("p".into());
        record.owner_id = Some("o".into());
        record.merged_ids = Some(vec![]);
        record.website = Some("w".into());
        record.industry = Some("i".into());
        record.plan = Some("p".into());
        record.description = Some("d".into());

        let json = serde_json::to_value(&record).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), Record::FIELD_NAMES.len());
        for key in keys {
            assert!(Record::is_field_name(key), "missing field name {key}");
        }
    }

    #[test]
    fn test_apply_overlays_only_present_fields() {
        let mut record = Record::new();
        record.primary_name = Some("Old".into());
        record.website = Some("old.example".into());

        let patch = RecordPatch {
            primary_name: Some("New".into()),
            tag_ids: Some(vec!["t1".into()]),
            ..RecordPatch::default()
        };
        record.apply(&patch);

        assert_eq!(record.primary_name.as_deref(), Some("New"));
        assert_eq!(record.website.as_deref(), Some("old.example"));
        assert_eq!(record.tag_ids, vec!["t1".to_string()]);
    }

    #[test]
    fn test_from_patch_stamps_timestamps() {
        let now = Utc::now();
        let id = RecordId::new();
        let record = Record::from_patch(id, RecordPatch::default(), now);
        assert_eq!(record.id, id);
        assert_eq!(record.created_at, now);
        assert_eq!(record.modified_at, now);
        assert!(record.is_active());
    }

    #[test]
    fn test_fields_builder_accumulates() {
        let fields = RecordFields::new()
            .tag("t1")
            .tag("t2")
            .custom_field("f1", "v")
            .scope_brand("b1");
        assert_eq!(fields.tag_ids.unwrap().len(), 2);
        assert_eq!(fields.custom_fields_data.unwrap()[0].field_id, "f1");
        assert_eq!(fields.scope_brand_ids.unwrap(), vec!["b1".to_string()]);
    }

    #[test]
    fn test_fields_deserialize_singular_keys() {
        let fields: RecordFields =
            serde_json::from_str(r#"{"primaryName":"Acme","email":"a@acme.com"}"#).unwrap();
        assert_eq!(fields.primary_name.as_deref(), Some("Acme"));
        assert_eq!(fields.email.as_deref(), Some("a@acme.com"));
        assert!(fields.emails.is_none());
    }
}
