//! This module defines the `DestinationStore` trait, which provides an interface
//! for writing migrated records to the relational store and for resolving the
//! primary keys the store generated for them.
use std::collections::HashMap;

use study_migrator_shared::types::{
    NewChunkRegistry, NewDeviceSettings, NewParticipant, NewResearcher, NewStudy, NewSurvey,
    PrimaryKey, StudyKey, StudyResearcher, UniqueKey,
};

use crate::errors::DestinationStoreError;
use crate::types::TableCounts;

/// A trait that defines the interface for the relational destination store.
///
/// Every `insert_*` method is a single bulk insert: either all rows of the
/// call are written or none are. Empty slices are no-ops.
#[async_trait::async_trait]
pub trait DestinationStore: Send + Sync {
    /// Bulk inserts studies.
    async fn insert_studies(&self, studies: &[NewStudy]) -> Result<(), DestinationStoreError>;

    /// Bulk inserts surveys.
    async fn insert_surveys(&self, surveys: &[NewSurvey]) -> Result<(), DestinationStoreError>;

    /// Bulk inserts device settings.
    async fn insert_device_settings(
        &self,
        settings: &[NewDeviceSettings],
    ) -> Result<(), DestinationStoreError>;

    /// Bulk inserts researchers.
    async fn insert_researchers(
        &self,
        researchers: &[NewResearcher],
    ) -> Result<(), DestinationStoreError>;

    /// Bulk inserts rows of the study ⇄ researcher relation.
    async fn insert_study_researchers(
        &self,
        relations: &[StudyResearcher],
    ) -> Result<(), DestinationStoreError>;

    /// Bulk inserts participants.
    async fn insert_participants(
        &self,
        participants: &[NewParticipant],
    ) -> Result<(), DestinationStoreError>;

    /// Bulk inserts chunk registry rows.
    async fn insert_chunk_registries(
        &self,
        chunks: &[NewChunkRegistry],
    ) -> Result<(), DestinationStoreError>;

    /// Resolves a study by its unique name.
    async fn find_study_by_name(&self, name: &str)
    -> Result<Option<StudyKey>, DestinationStoreError>;

    /// Returns the name of a study, for error reporting.
    async fn study_name(&self, pk: PrimaryKey) -> Result<Option<String>, DestinationStoreError>;

    /// Resolves a survey by its legacy object id.
    async fn find_survey_by_object_id(
        &self,
        object_id: &str,
    ) -> Result<Option<PrimaryKey>, DestinationStoreError>;

    /// Resolves a participant by patient id.
    async fn find_participant_by_patient_id(
        &self,
        patient_id: &str,
    ) -> Result<Option<PrimaryKey>, DestinationStoreError>;

    /// Maps every researcher username to its primary key.
    async fn researcher_ids(&self) -> Result<HashMap<String, PrimaryKey>, DestinationStoreError>;

    /// Checks whether a row already holds the given unique value.
    async fn exists(&self, key: UniqueKey<'_>) -> Result<bool, DestinationStoreError>;

    /// Counts the rows of every migrated table.
    async fn counts(&self) -> Result<TableCounts, DestinationStoreError>;
}
