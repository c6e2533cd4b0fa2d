//! List-field normalization.
//!
//! Callers may describe names, emails and phones either through the plural
//! lists or through the singular convenience inputs. Normalization folds both
//! into the stored lists:
//!
//! | Input            | Effect                                                    |
//! |------------------|-----------------------------------------------------------|
//! | `names`/`emails`/`phones` | accumulated; unioned with the existing record on update |
//! | `email`          | appended to `emails` if absent, becomes `primary_email`   |
//! | `phone`          | appended to `phones` if absent, becomes `primary_phone`   |
//! | `name`           | appended to `names` if absent                             |
//! | `tracked_data`   | entries naming a built-in field (or `name`) are dropped   |
//!
//! Lists are order-stable sets: the first occurrence of a value wins its
//! position and later duplicates are dropped.

use std::collections::HashSet;

use crate::record::{Record, RecordFields, RecordPatch, TrackedDataEntry};

/// Removes duplicates while keeping the first occurrence of each value.
#[must_use]
pub fn dedup_stable(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Appends `value` unless it is already present.
fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// `existing` followed by `candidate`, deduplicated.
fn union(existing: &[String], candidate: Option<Vec<String>>) -> Vec<String> {
    let mut out = existing.to_vec();
    out.extend(candidate.unwrap_or_default());
    dedup_stable(out)
}

/// Drops tracked entries that collide with built-in record fields.
#[must_use]
pub fn filter_tracked_data(entries: Vec<TrackedDataEntry>) -> Vec<TrackedDataEntry> {
    entries
        .into_iter()
        .filter(|e| e.field != "name" && !Record::is_field_name(&e.field))
        .collect()
}

/// Folds the convenience inputs of `fields` into a store-ready patch.
///
/// With `existing`, the plural lists are unioned with the record's current
/// lists, so an update never drops a name, email or phone.
#[must_use]
pub fn fix_list_fields(fields: RecordFields, existing: Option<&Record>) -> RecordPatch {
    let RecordFields {
        primary_name,
        code,
        name,
        email,
        phone,
        primary_email,
        primary_phone,
        names,
        emails,
        phones,
        owner_id,
        scope_brand_ids,
        custom_fields_data,
        tracked_data,
        tag_ids,
        website,
        industry,
        plan,
        description,
        metadata,
    } = fields;

    let (mut names, mut emails, mut phones) = match existing {
        Some(record) => (
            union(&record.names, names),
            union(&record.emails, emails),
            union(&record.phones, phones),
        ),
        None => (
            dedup_stable(names.unwrap_or_default()),
            dedup_stable(emails.unwrap_or_default()),
            dedup_stable(phones.unwrap_or_default()),
        ),
    };

    let mut primary_email = primary_email;
    if let Some(email) = email {
        push_unique(&mut emails, &email);
        primary_email = Some(email);
    }

    let mut primary_phone = primary_phone;
    if let Some(phone) = phone {
        push_unique(&mut phones, &phone);
        primary_phone = Some(phone);
    }

    if let Some(name) = name {
        push_unique(&mut names, &name);
    }

    RecordPatch {
        status: None,
        primary_name,
        code,
        primary_email,
        primary_phone,
        names: Some(names),
        emails: Some(emails),
        phones: Some(phones),
        owner_id,
        scope_brand_ids,
        custom_fields_data,
        tracked_data: tracked_data.map(filter_tracked_data),
        tag_ids,
        merged_ids: None,
        website,
        industry,
        plan,
        description,
        metadata,
        search_text: None,
        modified_at: None,
    }
}
