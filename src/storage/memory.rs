//! In-memory storage backend.
//!
//! This module provides a thread-safe in-memory implementation of
//! [`RecordStore`]. It is intended for embedded usage, tests, the CLI snapshot
//! workflow, and as a reference implementation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use crate::record::{Record, RecordId, RecordPatch};
use crate::storage::filter::RecordFilter;
use crate::storage::traits::{RecordStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

#[derive(Debug, Default)]
struct RecordState {
    by_id: HashMap<RecordId, Record>,
    // Insertion order, so query results are deterministic.
    order: Vec<RecordId>,
}

impl RecordState {
    fn check_unique(&self, candidate: &Record) -> Result<(), StorageError> {
        if !candidate.is_active() {
            return Ok(());
        }
        let name = non_empty(candidate.primary_name.as_ref());
        let code = non_empty(candidate.code.as_ref());
        if name.is_none() && code.is_none() {
            return Ok(());
        }

        for other in self.by_id.values() {
            if other.id == candidate.id || !other.is_active() {
                continue;
            }
            if name.is_some() && non_empty(other.primary_name.as_ref()) == name {
                return Err(StorageError::DuplicateKey(format!(
                    "primaryName={}",
                    name.unwrap_or_default()
                )));
            }
            if code.is_some() && non_empty(other.code.as_ref()) == code {
                return Err(StorageError::DuplicateKey(format!(
                    "code={}",
                    code.unwrap_or_default()
                )));
            }
        }
        Ok(())
    }
}

/// Thread-safe in-memory record store.
///
/// With [`with_unique_indexes`](Self::with_unique_indexes) the store also
/// rejects writes that would give two active records the same non-empty
/// primary name or code.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    state: RwLock<RecordState>,
    unique_indexes: bool,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store enforcing unique active names and codes.
    #[must_use]
    pub fn with_unique_indexes() -> Self {
        Self {
            state: RwLock::default(),
            unique_indexes: true,
        }
    }

    /// Create a store pre-populated with `records`.
    ///
    /// # Errors
    /// - `DuplicateKey`: if two records share an ID
    pub fn from_records(records: Vec<Record>) -> Result<Self, StorageError> {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Load a store from a JSON array of records.
    ///
    /// A missing file yields an empty store.
    ///
    /// # Errors
    /// - `Io`: if the file exists but cannot be read
    /// - `SerializationError`: if the content is not a JSON array of records
    pub fn load_json(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        let records: Vec<Record> = serde_json::from_str(&raw)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        Self::from_records(records)
    }

    /// Write every record, in insertion order, as a pretty JSON array.
    ///
    /// # Errors
    /// - `Io`: if the file cannot be written
    pub fn save_json(&self, path: &Path) -> Result<(), StorageError> {
        let records = self.snapshot()?;
        let raw = serde_json::to_string_pretty(&records)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// All records in insertion order, whatever their status.
    ///
    /// # Errors
    /// - `BackendError`: if the lock is poisoned
    pub fn snapshot(&self) -> Result<Vec<Record>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("record.snapshot"))?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.by_id.get(id).cloned())
            .collect())
    }

    /// Number of stored records, whatever their status.
    ///
    /// # Errors
    /// - `BackendError`: if the lock is poisoned
    pub fn len(&self) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("record.len"))?;
        Ok(state.by_id.len())
    }

    /// Returns true if no records are stored.
    ///
    /// # Errors
    /// - `BackendError`: if the lock is poisoned
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(&self, record: Record) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("record.insert"))?;
        if state.by_id.contains_key(&record.id) {
            return Err(StorageError::DuplicateKey(record.id.to_string()));
        }
        if self.unique_indexes {
            state.check_unique(&record)?;
        }

        state.order.push(record.id);
        state.by_id.insert(record.id, record);
        Ok(())
    }

    fn get(&self, id: RecordId) -> Result<Option<Record>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("record.get"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn find(&self, filter: &RecordFilter) -> Result<Vec<Record>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("record.find"))?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.by_id.get(id))
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn update(&self, id: RecordId, patch: &RecordPatch) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("record.update"))?;
        let mut next = state
            .by_id
            .get(&id)
            .cloned()
            .ok_or(StorageError::RecordNotFound(id))?;
        next.apply(patch);

        if self.unique_indexes {
            state.check_unique(&next)?;
        }

        state.by_id.insert(id, next);
        Ok(())
    }

    fn delete_many(&self, ids: &[RecordId]) -> Result<usize, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("record.delete_many"))?;
        let mut removed = 0usize;
        for id in ids {
            if state.by_id.remove(id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            let RecordState { by_id, order } = &mut *state;
            order.retain(|id| by_id.contains_key(id));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::RecordStatus;
    use crate::storage::filter::with_active_filter;

    fn named(name: &str) -> Record {
        let mut r = Record::new();
        r.primary_name = Some(name.to_string());
        r
    }

    #[test]
    fn record_insert_get_update_delete() {
        let store = InMemoryRecordStore::new();
        let record = named("Acme");
        let id = record.id;

        store.insert(record.clone()).unwrap();
        assert!(matches!(
            store.insert(record.clone()),
            Err(StorageError::DuplicateKey(_))
        ));
        assert_eq!(store.get(id).unwrap().unwrap(), record);

        let patch = RecordPatch {
            website: Some("acme.io".into()),
            ..RecordPatch::default()
        };
        store.update(id, &patch).unwrap();
        let got = store.get(id).unwrap().unwrap();
        assert_eq!(got.website.as_deref(), Some("acme.io"));
        assert_eq!(got.primary_name.as_deref(), Some("Acme"));

        assert_eq!(store.delete_many(&[id, RecordId::new()]).unwrap(), 1);
        assert!(store.get(id).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn update_missing_record_fails() {
        let store = InMemoryRecordStore::new();
        let missing = RecordId::new();
        let err = store.update(missing, &RecordPatch::default()).unwrap_err();
        assert!(matches!(err, StorageError::RecordNotFound(id) if id == missing));
    }

    #[test]
    fn find_preserves_insertion_order() {
        let store = InMemoryRecordStore::new();
        let names = ["c", "a", "b"];
        for name in names {
            store.insert(named(name)).unwrap();
        }

        let found: Vec<String> = store
            .find(&RecordFilter::new())
            .unwrap()
            .into_iter()
            .filter_map(|r| r.primary_name)
            .collect();
        assert_eq!(found, vec!["c", "a", "b"]);
    }

    #[test]
    fn find_with_active_filter_skips_deleted() {
        let store = InMemoryRecordStore::new();
        let a = named("a");
        let b = named("b");
        let a_id = a.id;
        store.insert(a).unwrap();
        store.insert(b).unwrap();

        store
            .update(a_id, &RecordPatch::status(RecordStatus::Deleted, chrono::Utc::now()))
            .unwrap();

        let all = store.find(&RecordFilter::new()).unwrap();
        let active = store.find(&with_active_filter(RecordFilter::new())).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].primary_name.as_deref(), Some("b"));
    }

    #[test]
    fn unique_indexes_reject_active_duplicates() {
        let store = InMemoryRecordStore::with_unique_indexes();
        let first = named("Acme");
        let first_id = first.id;
        store.insert(first).unwrap();

        let err = store.insert(named("Acme")).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey(ref k) if k == "primaryName=Acme"));

        let mut coded = named("Other");
        coded.code = Some("C1".into());
        store.insert(coded).unwrap();
        let mut clash = named("Third");
        clash.code = Some("C1".into());
        assert!(store.insert(clash).is_err());

        // Once the holder is deleted the name is free again.
        store
            .update(first_id, &RecordPatch::status(RecordStatus::Deleted, chrono::Utc::now()))
            .unwrap();
        store.insert(named("Acme")).unwrap();
    }

    #[test]
    fn unique_indexes_apply_to_updates() {
        let store = InMemoryRecordStore::with_unique_indexes();
        let a = named("A");
        let b = named("B");
        let b_id = b.id;
        store.insert(a).unwrap();
        store.insert(b).unwrap();

        let rename = RecordPatch {
            primary_name: Some("A".into()),
            ..RecordPatch::default()
        };
        assert!(store.update(b_id, &rename).is_err());
        assert_eq!(
            store.get(b_id).unwrap().unwrap().primary_name.as_deref(),
            Some("B")
        );
    }

    #[test]
    fn empty_names_are_not_indexed() {
        let store = InMemoryRecordStore::with_unique_indexes();
        store.insert(named("")).unwrap();
        store.insert(named("")).unwrap();
        store.insert(Record::new()).unwrap();
        store.insert(Record::new()).unwrap();
        assert_eq!(store.len().unwrap(), 4);
    }

    #[test]
    fn snapshot_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");

        let store = InMemoryRecordStore::new();
        let mut a = named("Acme");
        a.emails = vec!["a@acme.com".into()];
        store.insert(a.clone()).unwrap();
        store.insert(named("Globex")).unwrap();
        store.save_json(&path).unwrap();

        let loaded = InMemoryRecordStore::load_json(&path).unwrap();
        let records = loaded.snapshot().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], a);
        assert_eq!(records[1].primary_name.as_deref(), Some("Globex"));
    }

    #[test]
    fn load_missing_or_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(InMemoryRecordStore::load_json(&missing).unwrap().is_empty().unwrap());

        let blank = dir.path().join("blank.json");
        std::fs::write(&blank, "  \n").unwrap();
        assert!(InMemoryRecordStore::load_json(&blank).unwrap().is_empty().unwrap());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(
            InMemoryRecordStore::load_json(&bad),
            Err(StorageError::SerializationError(_))
        ));
    }
}
