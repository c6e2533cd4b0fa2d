use std::sync::Arc;

use crm_records::{
    CollaboratorError, Collaborators, Conformity, ConformityGraph, ContentType, DuplicateKind,
    InMemoryBackend, RecordError, RecordFields, RecordFilter, RecordId, RecordService,
    RecordServiceConfig, RecordStatus, ValidationError,
};

fn setup() -> (InMemoryBackend, RecordService) {
    let backend = InMemoryBackend::new();
    let service = backend.service(RecordServiceConfig::default());
    (backend, service)
}

#[test]
fn merge_unions_lists_and_deletes_sources() {
    let (_, service) = setup();
    let a = service
        .create(
            RecordFields::new().primary_name("Acme").tag("t1").emails(["x@e"]),
            None,
        )
        .unwrap();
    let b = service
        .create(
            RecordFields::new()
                .primary_name("ACME Inc")
                .tag("t2")
                .tag("t1")
                .emails(["x@e", "y@e"]),
            None,
        )
        .unwrap();

    let merged = service
        .merge(&[a.id, b.id], RecordFields::new().primary_name("Acme"))
        .unwrap();

    assert_eq!(merged.tag_ids, vec!["t1", "t2"]);
    assert_eq!(merged.emails, vec!["x@e", "y@e"]);
    assert_eq!(merged.merged_ids, Some(vec![a.id, b.id]));
    assert_eq!(merged.primary_name.as_deref(), Some("Acme"));
    assert!(merged.is_active());

    assert_eq!(service.get(a.id).unwrap().status, RecordStatus::Deleted);
    assert_eq!(service.get(b.id).unwrap().status, RecordStatus::Deleted);

    let active = service.find_active(RecordFilter::new()).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, merged.id);
}

#[test]
fn merge_repoints_notes_and_conformities() {
    let (backend, service) = setup();
    let company = ContentType::Company;
    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let b = service.create(RecordFields::new().primary_name("B"), None).unwrap();
    let customer = RecordId::new();

    backend.notes.add(company.clone(), a.id, "called them").unwrap();
    backend.notes.add(company.clone(), b.id, "sent quote").unwrap();
    backend
        .conformities
        .add(Conformity::new(
            company.clone(),
            a.id.to_string(),
            ContentType::Customer,
            customer.to_string(),
        ))
        .unwrap();
    backend
        .conformities
        .add(Conformity::new(
            ContentType::Customer,
            customer.to_string(),
            company.clone(),
            b.id.to_string(),
        ))
        .unwrap();

    let merged = service.merge(&[a.id, b.id], RecordFields::new()).unwrap();

    assert_eq!(backend.notes.notes_for(&company, merged.id).len(), 2);
    assert!(backend.notes.notes_for(&company, a.id).is_empty());
    assert!(backend.conformities.related(&company, a.id).is_empty());
    assert!(backend.conformities.related(&company, b.id).is_empty());
    assert!(!backend.conformities.related(&company, merged.id).is_empty());
}

#[test]
fn merge_override_may_reuse_source_name() {
    let (_, service) = setup();
    let a = service
        .create(RecordFields::new().primary_name("Acme").code("AC1"), None)
        .unwrap();
    let b = service.create(RecordFields::new().primary_name("Acme 2"), None).unwrap();

    let merged = service
        .merge(&[a.id, b.id], RecordFields::new().primary_name("Acme").code("AC1"))
        .unwrap();
    assert_eq!(merged.code.as_deref(), Some("AC1"));
}

#[test]
fn merge_rejects_name_of_unrelated_record() {
    let (_, service) = setup();
    service.create(RecordFields::new().primary_name("Globex"), None).unwrap();
    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let b = service.create(RecordFields::new().primary_name("B"), None).unwrap();

    let err = service
        .merge(&[a.id, b.id], RecordFields::new().primary_name("Globex"))
        .unwrap_err();
    assert_eq!(err.duplicate_kind(), Some(DuplicateKind::Name));
    assert!(service.get(a.id).unwrap().is_active());
    assert!(service.get(b.id).unwrap().is_active());
}

#[test]
fn merge_needs_two_distinct_sources() {
    let (_, service) = setup();
    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();

    let err = service.merge(&[a.id], RecordFields::new()).unwrap_err();
    assert!(matches!(
        err,
        RecordError::Validation(ValidationError::TooFewMergeSources { count: 1 })
    ));

    let err = service.merge(&[a.id, a.id], RecordFields::new()).unwrap_err();
    assert!(matches!(
        err,
        RecordError::Validation(ValidationError::RepeatedMergeSource { .. })
    ));
    assert!(service.get(a.id).unwrap().is_active());
}

#[test]
fn merge_with_missing_source_keeps_earlier_sources_deleted() {
    let (_, service) = setup();
    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let missing = RecordId::new();

    let err = service.merge(&[a.id, missing], RecordFields::new()).unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(service.get(a.id).unwrap().status, RecordStatus::Deleted);
    assert!(service.find_active(RecordFilter::new()).unwrap().is_empty());
}

#[test]
fn merge_treats_deleted_source_as_missing() {
    let (_, service) = setup();
    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let b = service.create(RecordFields::new().primary_name("B"), None).unwrap();
    service.remove(&[a.id]).unwrap();

    let err = service.merge(&[a.id, b.id], RecordFields::new()).unwrap_err();
    assert!(err.is_not_found());
    assert!(service.get(b.id).unwrap().is_active());
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

#[test]
fn merge_failure_after_create_is_not_rolled_back() {
    let backend = InMemoryBackend::new();
    let collaborators = Collaborators {
        conformities: Arc::new(BrokenConformities),
        ..backend.collaborators()
    };
    let service = RecordService::new(
        backend.records.clone(),
        collaborators,
        RecordServiceConfig::default(),
    );

    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let b = service.create(RecordFields::new().primary_name("B"), None).unwrap();

    let err = service
        .merge(&[a.id, b.id], RecordFields::new().primary_name("AB"))
        .unwrap_err();
    assert!(err.is_collaborator());

    assert_eq!(service.get(a.id).unwrap().status, RecordStatus::Deleted);
    assert_eq!(service.get(b.id).unwrap().status, RecordStatus::Deleted);
    let active = service.find_active(RecordFilter::new()).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].merged_ids, Some(vec![a.id, b.id]));
}

#[test]
fn update_keeps_merge_provenance() {
    let (_, service) = setup();
    let a = service.create(RecordFields::new().primary_name("A"), None).unwrap();
    let b = service.create(RecordFields::new().primary_name("B"), None).unwrap();
    let merged = service
        .merge(&[a.id, b.id], RecordFields::new().primary_name("AB"))
        .unwrap();

    let fields: RecordFields =
        serde_json::from_value(serde_json::json!({ "mergedIds": [], "plan": "pro" })).unwrap();
    let updated = service.update(merged.id, fields).unwrap();

    assert_eq!(updated.plan.as_deref(), Some("pro"));
    assert_eq!(updated.merged_ids, Some(vec![a.id, b.id]));
}

#[test]
fn create_ignores_caller_supplied_provenance() {
    let (_, service) = setup();
    let c = service.create(RecordFields::new().primary_name("C"), None).unwrap();

    let fields: RecordFields = serde_json::from_value(serde_json::json!({
        "primaryName": "D",
        "mergedIds": [c.id.to_string()],
    }))
    .unwrap();
    let d = service.create(fields, None).unwrap();

    assert_eq!(d.primary_name.as_deref(), Some("D"));
    assert_eq!(d.merged_ids, None);
    assert!(service.get(c.id).unwrap().is_active());
}
