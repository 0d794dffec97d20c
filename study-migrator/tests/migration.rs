//! End-to-end tests of the migration stages against the in-memory stores.
//!
//! Run with: `cargo test --test migration`

mod common;

use std::sync::Arc;

use common::*;
use study_migrator::MigrationError;
use study_migrator_repository::{Collection, InMemoryDestinationStore, InMemorySourceStore};
use study_migrator_repository::memory::InsertCall;
use study_migrator_shared::types::{EntityKind, ObjectId};
use study_migrator_shared::validation::ValidationError;

// ============================================================================
// Full runs
// ============================================================================

#[tokio::test]
async fn test_single_study_end_to_end() {
    let destination = Arc::new(InMemoryDestinationStore::new());

    let report = migrator(single_study_source(false), &destination)
        .run()
        .await
        .unwrap();

    let tables = destination.snapshot().await;
    assert_eq!(tables.studies.len(), 1);
    assert_eq!(tables.surveys.len(), 1);
    assert_eq!(tables.device_settings.len(), 1);
    assert_eq!(tables.researchers.len(), 1);
    assert_eq!(tables.study_researchers.len(), 1);
    assert_eq!(tables.participants.len(), 1);

    let study = &tables.studies[0];
    assert_eq!(study.record.name, "A");
    assert_eq!(study.record.object_id, oid(1));
    assert_eq!(tables.surveys[0].record.study_id, study.pk);
    assert_eq!(tables.device_settings[0].record.study_id, study.pk);
    let consent_sections: serde_json::Value =
        serde_json::from_str(&tables.device_settings[0].record.consent_sections).unwrap();
    assert_eq!(
        consent_sections,
        serde_json::json!({"welcome": {"text": "", "more": ""}})
    );
    assert_eq!(tables.study_researchers[0].record.study_id, study.pk);
    assert_eq!(
        tables.study_researchers[0].record.researcher_id,
        tables.researchers[0].pk
    );
    assert_eq!(tables.researchers[0].record.access_key_id, None);

    assert_eq!(report.before.studies, 0);
    assert_eq!(report.after.studies, 1);
    assert_eq!(report.after.researchers, 1);
}

#[tokio::test]
async fn test_deleted_study_propagates_to_dependents() {
    let study = oid(1);
    let survey = oid(2);
    let source = single_study_source(true).with_document(
        Collection::ChunkRegistries,
        chunk_doc(0, &study, "abc12345", Some(&survey)),
    );
    let destination = Arc::new(InMemoryDestinationStore::new());

    migrator(source, &destination).run().await.unwrap();

    let tables = destination.snapshot().await;
    assert!(tables.studies[0].record.deleted);
    assert!(tables.surveys[0].record.deleted);
    assert!(tables.device_settings[0].record.deleted);
    assert!(tables.participants[0].record.deleted);
    assert!(tables.chunk_registries[0].record.deleted);
    assert!(!tables.researchers[0].record.deleted);
}

#[tokio::test]
async fn test_rerun_is_not_idempotent() {
    let destination = Arc::new(InMemoryDestinationStore::new());
    migrator(single_study_source(false), &destination)
        .run()
        .await
        .unwrap();
    let first = destination.snapshot().await.counts();

    let failure = migrator(single_study_source(false), &destination)
        .run()
        .await
        .unwrap_err();

    assert_eq!(destination.snapshot().await.counts(), first);
    assert_eq!(failure.report.before, first);
    assert_eq!(failure.report.after, first);
    assert!(failure.errors.iter().any(|e| matches!(
        e,
        MigrationError::Validation {
            kind: EntityKind::Study,
            source: ValidationError::Duplicate { field: "name", .. },
            ..
        }
    )));
    assert!(failure.errors.iter().any(|e| matches!(
        e,
        MigrationError::Validation {
            kind: EntityKind::Researcher,
            source: ValidationError::Duplicate { field: "username", .. },
            ..
        }
    )));
}

#[tokio::test]
async fn test_malformed_document_is_reported_and_run_continues() {
    let source = single_study_source(false)
        .with_document(Collection::Admins, serde_json::json!({"_id": "carol"}));
    let destination = Arc::new(InMemoryDestinationStore::new());

    let failure = migrator(source, &destination).run().await.unwrap_err();

    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(failure.errors[0], MigrationError::Source(_)));
    assert_eq!(destination.snapshot().await.researchers.len(), 1);
}

// ============================================================================
// Studies and their relations
// ============================================================================

#[tokio::test]
async fn test_study_without_referents_has_no_relation_side_effects() {
    let source = InMemorySourceStore::new().with_document(
        Collection::Studies,
        study_doc(&oid(1), "Lonely", false, &[], &[], None),
    );
    let destination = Arc::new(InMemoryDestinationStore::new());
    let mut migrator = migrator(source, &destination);

    migrator.migrate_studies().await;
    migrator.remap_study_relationships().await;
    migrator.migrate_admins().await;

    let context = migrator.context();
    assert_eq!(context.studies.len(), 1);
    assert!(context.survey_owners.is_empty());
    assert!(context.settings_owners.is_empty());
    assert!(context.pending_study_researchers.is_empty());
    assert!(migrator.errors().is_empty());
    assert!(destination.snapshot().await.study_researchers.is_empty());
}

#[tokio::test]
async fn test_study_missing_after_insert_is_excluded_downstream() {
    let destination =
        Arc::new(InMemoryDestinationStore::new().with_silently_dropped(EntityKind::Study));
    let mut migrator = migrator(single_study_source(false), &destination);

    migrator.migrate_studies().await;
    migrator.remap_study_relationships().await;
    migrator.migrate_surveys().await;

    assert!(migrator.context().studies.is_empty());
    assert!(migrator.context().survey_owners.is_empty());
    let errors = migrator.errors().errors();
    assert!(matches!(
        &errors[0],
        MigrationError::ObjectCreation { kind: EntityKind::Study, id } if id == "A"
    ));
    assert!(matches!(
        &errors[1],
        MigrationError::MissingRequiredForeignKey { kind: EntityKind::Survey, .. }
    ));
}

#[tokio::test]
async fn test_missing_survey_reference_is_referential_error() {
    let source = InMemorySourceStore::new().with_document(
        Collection::Studies,
        study_doc(&oid(1), "A", false, &[&oid(9)], &[], None),
    );
    let destination = Arc::new(InMemoryDestinationStore::new());
    let mut migrator = migrator(source, &destination);

    migrator.migrate_studies().await;
    migrator.remap_study_relationships().await;

    let errors = migrator.errors().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        format!(
            "Survey {} is referenced by Study A but does not exist in the database",
            oid(9)
        )
    );
}

#[tokio::test]
async fn test_unknown_admin_is_reported_with_study_name() {
    let source = InMemorySourceStore::new()
        .with_document(
            Collection::Studies,
            study_doc(&oid(1), "Sleep Study", false, &[], &["bob", "ghost"], None),
        )
        .with_document(Collection::Admins, admin_doc("bob"));
    let destination = Arc::new(InMemoryDestinationStore::new());

    let failure = migrator(source, &destination).run().await.unwrap_err();

    assert_eq!(failure.errors.len(), 1);
    assert_eq!(
        failure.errors[0].to_string(),
        "Admin ghost is referenced by Study Sleep Study but does not exist in the database"
    );
    assert_eq!(destination.snapshot().await.study_researchers.len(), 1);
}

// ============================================================================
// Surveys
// ============================================================================

#[tokio::test]
async fn test_orphan_survey_fails_alone() {
    let orphan = oid(7);
    let source = single_study_source(false).with_document(Collection::Surveys, survey_doc(&orphan));
    let destination = Arc::new(InMemoryDestinationStore::new());
    let mut migrator = migrator(source, &destination);

    migrator.migrate_studies().await;
    migrator.remap_study_relationships().await;
    migrator.migrate_surveys().await;

    let errors = migrator.errors().errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        format!(
            "Survey {} is present in the database but is not connected to any Study",
            orphan
        )
    );
    assert_eq!(migrator.context().surveys.len(), 1);
    assert!(migrator.context().surveys.contains_key(&ObjectId::new(oid(2))));
}

#[tokio::test]
async fn test_rejected_survey_insert_reports_every_survey() {
    let destination =
        Arc::new(InMemoryDestinationStore::new().with_failing_inserts(EntityKind::Survey));
    let mut migrator = migrator(single_study_source(false), &destination);

    migrator.migrate_studies().await;
    migrator.remap_study_relationships().await;
    migrator.migrate_surveys().await;

    let errors = migrator.errors().errors();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], MigrationError::Destination(_)));
    assert!(matches!(
        errors[1],
        MigrationError::ObjectCreation { kind: EntityKind::Survey, .. }
    ));
    assert!(migrator.context().surveys.is_empty());
}

// ============================================================================
// Device settings
// ============================================================================

#[tokio::test]
async fn test_dangling_and_orphan_device_settings_are_reported() {
    let referenced = oid(50);
    let orphan = oid(51);
    let source = InMemorySourceStore::new()
        .with_document(
            Collection::Studies,
            study_doc(&oid(1), "A", false, &[], &[], Some(&referenced)),
        )
        .with_document(Collection::DeviceSettings, settings_doc(&orphan));
    let destination = Arc::new(InMemoryDestinationStore::new());
    let mut migrator = migrator(source, &destination);

    migrator.migrate_studies().await;
    migrator.remap_study_relationships().await;
    migrator.migrate_settings().await;

    let errors = migrator.errors().errors();
    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors[0].to_string(),
        format!(
            "DeviceSettings {} is referenced by Study A but does not exist in the database",
            referenced
        )
    );
    assert_eq!(
        errors[1].to_string(),
        format!(
            "DeviceSettings {} is present in the database but is not connected to any Study",
            orphan
        )
    );
    assert!(destination.snapshot().await.device_settings.is_empty());
}

// ============================================================================
// Admins and users
// ============================================================================

#[tokio::test]
async fn test_admin_listed_twice_is_linked_once() {
    let source = InMemorySourceStore::new()
        .with_document(
            Collection::Studies,
            study_doc(&oid(1), "A", false, &[], &["bob", "bob"], None),
        )
        .with_document(Collection::Admins, admin_doc("bob"));
    let destination = Arc::new(InMemoryDestinationStore::new());

    migrator(source, &destination).run().await.unwrap();

    let tables = destination.snapshot().await;
    assert_eq!(tables.researchers.len(), 1);
    assert_eq!(tables.study_researchers.len(), 1);
}

#[tokio::test]
async fn test_dropped_participant_insert_is_object_creation_error() {
    let destination = Arc::new(
        InMemoryDestinationStore::new().with_silently_dropped(EntityKind::Participant),
    );

    let failure = migrator(single_study_source(false), &destination)
        .run()
        .await
        .unwrap_err();

    assert_eq!(failure.errors.len(), 1);
    assert_eq!(failure.errors[0].to_string(), "User abc12345 was not created");
    assert!(destination.snapshot().await.participants.is_empty());
}

// ============================================================================
// Chunk registries
// ============================================================================

#[tokio::test]
async fn test_chunk_without_survey_gets_null_survey() {
    let source = single_study_source(false).with_document(
        Collection::ChunkRegistries,
        chunk_doc(0, &oid(1), "abc12345", None),
    );
    let destination = Arc::new(InMemoryDestinationStore::new());

    migrator(source, &destination).run().await.unwrap();

    let tables = destination.snapshot().await;
    assert_eq!(tables.chunk_registries.len(), 1);
    assert_eq!(tables.chunk_registries[0].record.survey_id, None);
    assert_eq!(tables.chunk_registries[0].record.chunk_hash, "");
}

#[tokio::test]
async fn test_chunk_with_unknown_survey_fails_alone() {
    let study = oid(1);
    let source = single_study_source(false).with_documents(
        Collection::ChunkRegistries,
        [
            chunk_doc(0, &study, "abc12345", Some(&oid(2))),
            chunk_doc(1, &study, "abc12345", Some(&oid(99))),
            chunk_doc(2, &study, "abc12345", None),
        ],
    );
    let destination = Arc::new(InMemoryDestinationStore::new());

    let failure = migrator(source, &destination).run().await.unwrap_err();

    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(
        &failure.errors[0],
        MigrationError::Referential { kind: EntityKind::Survey, id, .. } if *id == oid(99)
    ));
    let tables = destination.snapshot().await;
    assert_eq!(tables.chunk_registries.len(), 2);
    assert_eq!(tables.chunk_registries[0].record.survey_id, Some(tables.surveys[0].pk));
    let chunk_inserts: Vec<_> = tables
        .insert_calls
        .iter()
        .filter(|call| call.kind == EntityKind::ChunkRegistry)
        .collect();
    assert_eq!(chunk_inserts.len(), 1);
}

#[tokio::test]
async fn test_chunk_for_unknown_user_is_referential_error() {
    let source = single_study_source(false).with_document(
        Collection::ChunkRegistries,
        chunk_doc(0, &oid(1), "nobody", None),
    );
    let destination = Arc::new(InMemoryDestinationStore::new());

    let failure = migrator(source, &destination).run().await.unwrap_err();

    assert!(matches!(
        &failure.errors[0],
        MigrationError::Referential { kind: EntityKind::Participant, id, .. } if id == "nobody"
    ));
    assert!(destination.snapshot().await.chunk_registries.is_empty());
}

#[tokio::test]
async fn test_chunks_are_inserted_in_batches() {
    let study = oid(1);
    let source = single_study_source(false).with_documents(
        Collection::ChunkRegistries,
        (0..2500).map(|n| chunk_doc(n, &study, "abc12345", None)),
    );
    let destination = Arc::new(InMemoryDestinationStore::new());

    migrator(source, &destination).run().await.unwrap();

    let tables = destination.snapshot().await;
    let chunk_inserts: Vec<InsertCall> = tables
        .insert_calls
        .iter()
        .copied()
        .filter(|call| call.kind == EntityKind::ChunkRegistry)
        .collect();
    assert_eq!(
        chunk_inserts.iter().map(|call| call.rows).collect::<Vec<_>>(),
        vec![1000, 1000, 500]
    );
    assert_eq!(tables.chunk_registries.len(), 2500);
}

#[tokio::test]
async fn test_chunk_batch_size_is_configurable() {
    let study = oid(1);
    let source = single_study_source(false).with_documents(
        Collection::ChunkRegistries,
        (0..10).map(|n| chunk_doc(n, &study, "abc12345", None)),
    );
    let destination = Arc::new(InMemoryDestinationStore::new());

    migrator(source, &destination)
        .with_chunk_batch_size(4)
        .run()
        .await
        .unwrap();

    let rows: Vec<usize> = destination
        .snapshot()
        .await
        .insert_calls
        .iter()
        .filter(|call| call.kind == EntityKind::ChunkRegistry)
        .map(|call| call.rows)
        .collect();
    assert_eq!(rows, vec![4, 4, 2]);
}
