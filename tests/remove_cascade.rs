use std::sync::Arc;

use crm_records::{
    ActivityEvent, CollaboratorError, Collaborators, Conformity, ConformityGraph, ContentType,
    InMemoryBackend, InternalNotes, RecordFields, RecordFilter, RecordId, RecordService,
    RecordServiceConfig, RecordStatus, RecordStore, RemovalMode,
};

struct BrokenNotes;

impl InternalNotes for BrokenNotes {
    fn remove_by_owner(&self, _: &ContentType, _: &[RecordId]) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::failed("notes", "timeout"))
    }

    fn change_owner(
        &self,
        _: &ContentType,
        _: RecordId,
        _: &[RecordId],
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::failed("notes", "timeout"))
    }
}

#[test]
fn soft_remove_cascades_and_marks_deleted() {
    let backend = InMemoryBackend::new();
    let service = backend.service(RecordServiceConfig::default());
    let company = ContentType::Company;

    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let b = service.create(RecordFields::new().primary_name("B"), None).unwrap();
    backend.notes.add(company.clone(), a.id, "note").unwrap();
    backend
        .conformities
        .add(Conformity::new(
            company.clone(),
            a.id.to_string(),
            ContentType::Deal,
            "deal-1",
        ))
        .unwrap();

    let outcome = service.remove(&[a.id, a.id]).unwrap();
    assert_eq!(outcome.matched, 1);

    assert_eq!(service.get(a.id).unwrap().status, RecordStatus::Deleted);
    assert!(service.get(b.id).unwrap().is_active());
    assert!(backend.notes.is_empty());
    assert!(backend.conformities.is_empty());

    let events = backend.activity.events();
    assert!(matches!(
        events.last(),
        Some(ActivityEvent::RemoveBulk { item_ids, .. }) if item_ids == &vec![a.id, a.id]
    ));
}

#[test]
fn hard_remove_drops_rows() {
    let backend = InMemoryBackend::new();
    let service = backend.service(RecordServiceConfig {
        removal_mode: RemovalMode::HardDelete,
        ..RecordServiceConfig::default()
    });

    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let outcome = service.remove(&[a.id, RecordId::new()]).unwrap();
    assert_eq!(outcome.matched, 1);

    assert!(service.get(a.id).unwrap_err().is_not_found());
    assert!(backend.records.get(a.id).unwrap().is_none());
}

#[test]
fn remove_of_unknown_ids_matches_nothing() {
    let backend = InMemoryBackend::new();
    let service = backend.service(RecordServiceConfig::default());
    assert_eq!(service.remove(&[]).unwrap().matched, 0);
    assert_eq!(service.remove(&[RecordId::new()]).unwrap().matched, 0);
}

struct BrokenConformities;

impl ConformityGraph for BrokenConformities {
    fn remove_by_main(&self, _: &ContentType, _: &[RecordId]) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::failed("conformities", "unavailable"))
    }

    fn change_conformity(
        &self,
        _: &ContentType,
        _: RecordId,
        _: &[RecordId],
    ) -> Result<(), CollaboratorError> {
        Err(CollaboratorError::failed("conformities", "unavailable"))
    }
}

fn service_with(backend: &InMemoryBackend, collaborators: Collaborators) -> RecordService {
    RecordService::new(
        backend.records.clone(),
        collaborators,
        RecordServiceConfig::default(),
    )
}

#[test]
fn failing_notes_stop_cascade_before_conformities() {
    let backend = InMemoryBackend::new();
    let service = service_with(
        &backend,
        Collaborators {
            notes: Arc::new(BrokenNotes),
            ..backend.collaborators()
        },
    );

    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    backend
        .conformities
        .add(Conformity::new(
            ContentType::Company,
            a.id.to_string(),
            ContentType::Deal,
            "deal-1",
        ))
        .unwrap();

    let err = service.remove(&[a.id]).unwrap_err();
    assert!(err.is_collaborator());
    assert!(format!("{err}").contains("notes failed: timeout"));

    // The activity log ran first, conformities were never reached.
    assert!(matches!(
        backend.activity.events().last(),
        Some(ActivityEvent::RemoveBulk { item_ids, .. }) if item_ids == &vec![a.id]
    ));
    assert_eq!(backend.conformities.len(), 1);

    assert!(service.get(a.id).unwrap().is_active());
    assert_eq!(service.find_active(RecordFilter::new()).unwrap().len(), 1);
}

#[test]
fn failing_conformities_leave_records_in_place() {
    let backend = InMemoryBackend::new();
    let service = service_with(
        &backend,
        Collaborators {
            conformities: Arc::new(BrokenConformities),
            ..backend.collaborators()
        },
    );

    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    backend.notes.add(ContentType::Company, a.id, "note").unwrap();

    let err = service.remove(&[a.id]).unwrap_err();
    assert!(err.is_collaborator());

    // Log and notes ran before the failing step; deletion did not.
    assert!(matches!(
        backend.activity.events().last(),
        Some(ActivityEvent::RemoveBulk { .. })
    ));
    assert!(backend.notes.is_empty());
    assert!(service.get(a.id).unwrap().is_active());
}
