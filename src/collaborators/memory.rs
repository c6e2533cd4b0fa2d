//! In-memory collaborators.
//!
//! Thread-safe reference implementations of the activity log, internal notes
//! and conformity graph, for embedded use and tests.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collaborators::{ActivityEvent, ActivityLog, CollaboratorError, ConformityGraph, InternalNotes};
use crate::record::{ContentType, RecordId};

fn lock_err(collaborator: &'static str) -> CollaboratorError {
    CollaboratorError::failed(collaborator, "poisoned lock")
}

fn id_strings(ids: &[RecordId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Activity log that keeps every event in memory.
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    events: RwLock<Vec<ActivityEvent>>,
}

impl InMemoryActivityLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ActivityLog for InMemoryActivityLog {
    fn put(&self, event: ActivityEvent) -> Result<(), CollaboratorError> {
        self.events
            .write()
            .map_err(|_| lock_err("activity log"))?
            .push(event);
        Ok(())
    }
}

/// A note attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Note ID.
    pub id: Uuid,
    /// Kind of the owning record.
    pub content_type: ContentType,
    /// ID of the owning record.
    pub owner_id: String,
    /// Note body.
    pub content: String,
    /// When the note was written.
    pub created_at: DateTime<Utc>,
}

/// Internal notes held in memory.
#[derive(Debug, Default)]
pub struct InMemoryInternalNotes {
    notes: RwLock<Vec<Note>>,
}

impl InMemoryInternalNotes {
    /// Create an empty note set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a note to `owner_id`.
    ///
    /// # Errors
    /// - `Failed`: if the lock is poisoned
    pub fn add(
        &self,
        content_type: ContentType,
        owner_id: RecordId,
        content: impl Into<String>,
    ) -> Result<Note, CollaboratorError> {
        let note = Note {
            id: Uuid::new_v4(),
            content_type,
            owner_id: owner_id.to_string(),
            content: content.into(),
            created_at: Utc::now(),
        };
        self.notes
            .write()
            .map_err(|_| lock_err("internal notes"))?
            .push(note.clone());
        Ok(note)
    }

    /// Notes currently owned by `owner_id`.
    #[must_use]
    pub fn notes_for(&self, content_type: &ContentType, owner_id: RecordId) -> Vec<Note> {
        let owner = owner_id.to_string();
        self.notes
            .read()
            .map(|notes| {
                notes
                    .iter()
                    .filter(|n| &n.content_type == content_type && n.owner_id == owner)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of notes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.read().map(|n| n.len()).unwrap_or_default()
    }

    /// Returns true if there are no notes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InternalNotes for InMemoryInternalNotes {
    fn remove_by_owner(
        &self,
        content_type: &ContentType,
        owner_ids: &[RecordId],
    ) -> Result<(), CollaboratorError> {
        let owners = id_strings(owner_ids);
        self.notes
            .write()
            .map_err(|_| lock_err("internal notes"))?
            .retain(|n| !(&n.content_type == content_type && owners.contains(&n.owner_id)));
        Ok(())
    }

    fn change_owner(
        &self,
        content_type: &ContentType,
        new_owner_id: RecordId,
        old_owner_ids: &[RecordId],
    ) -> Result<(), CollaboratorError> {
        let owners = id_strings(old_owner_ids);
        let new_owner = new_owner_id.to_string();
        let mut notes = self.notes.write().map_err(|_| lock_err("internal notes"))?;
        for note in notes
            .iter_mut()
            .filter(|n| &n.content_type == content_type && owners.contains(&n.owner_id))
        {
            note.owner_id.clone_from(&new_owner);
        }
        Ok(())
    }
}

/// A typed relationship between two items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conformity {
    /// Kind of the main item.
    pub main_type: ContentType,
    /// ID of the main item.
    pub main_id: String,
    /// Kind of the related item.
    pub rel_type: ContentType,
    /// ID of the related item.
    pub rel_id: String,
}

impl Conformity {
    /// Creates a relationship from `main` to `rel`.
    #[must_use]
    pub fn new(
        main_type: ContentType,
        main_id: impl Into<String>,
        rel_type: ContentType,
        rel_id: impl Into<String>,
    ) -> Self {
        Self {
            main_type,
            main_id: main_id.into(),
            rel_type,
            rel_id: rel_id.into(),
        }
    }

    fn involves(&self, content_type: &ContentType, ids: &[String]) -> bool {
        (&self.main_type == content_type && ids.contains(&self.main_id))
            || (&self.rel_type == content_type && ids.contains(&self.rel_id))
    }
}

/// Conformity graph held in memory.
///
/// A relationship can name a record on either side; both sides are considered
/// when removing or repointing.
#[derive(Debug, Default)]
pub struct InMemoryConformities {
    edges: RwLock<Vec<Conformity>>,
}

impl InMemoryConformities {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relationship.
    ///
    /// # Errors
    /// - `Failed`: if the lock is poisoned
    pub fn add(&self, conformity: Conformity) -> Result<(), CollaboratorError> {
        let mut edges = self.edges.write().map_err(|_| lock_err("conformities"))?;
        if !edges.contains(&conformity) {
            edges.push(conformity);
        }
        Ok(())
    }

    /// Relationships in which `id` of `content_type` takes part.
    #[must_use]
    pub fn related(&self, content_type: &ContentType, id: RecordId) -> Vec<Conformity> {
        let ids = [id.to_string()];
        self.edges
            .read()
            .map(|edges| {
                edges
                    .iter()
                    .filter(|c| c.involves(content_type, &ids))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of relationships.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.read().map(|e| e.len()).unwrap_or_default()
    }

    /// Returns true if the graph has no relationships.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConformityGraph for InMemoryConformities {
    fn remove_by_main(
        &self,
        main_type: &ContentType,
        main_ids: &[RecordId],
    ) -> Result<(), CollaboratorError> {
        let ids = id_strings(main_ids);
        self.edges
            .write()
            .map_err(|_| lock_err("conformities"))?
            .retain(|c| !c.involves(main_type, &ids));
        Ok(())
    }

    fn change_conformity(
        &self,
        content_type: &ContentType,
        new_id: RecordId,
        old_ids: &[RecordId],
    ) -> Result<(), CollaboratorError> {
        let old = id_strings(old_ids);
        let new_id = new_id.to_string();
        let mut edges = self.edges.write().map_err(|_| lock_err("conformities"))?;

        let mut repointed: Vec<Conformity> = Vec::with_capacity(edges.len());
        for mut edge in edges.drain(..) {
            if &edge.main_type == content_type && old.contains(&edge.main_id) {
                edge.main_id.clone_from(&new_id);
            }
            if &edge.rel_type == content_type && old.contains(&edge.rel_id) {
                edge.rel_id.clone_from(&new_id);
            }
            // Two sources related to the same item collapse into one edge.
            if !repointed.contains(&edge) {
                repointed.push(edge);
            }
        }
        *edges = repointed;
        Ok(())
    }
}
