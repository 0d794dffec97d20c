use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use study_migrator_shared::types::{
    EntityKind, NewChunkRegistry, NewDeviceSettings, NewParticipant, NewResearcher, NewStudy,
    NewSurvey, PrimaryKey, Record, StudyKey, StudyResearcher, UniqueKey,
};
use tokio::sync::Mutex;

use crate::errors::DestinationStoreError;
use crate::interfaces::DestinationStore;
use crate::types::TableCounts;

/// A row together with the primary key the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored<T> {
    pub pk: PrimaryKey,
    pub record: T,
}

/// One call to an `insert_*` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertCall {
    pub kind: EntityKind,
    pub rows: usize,
}

/// The full contents of an [`InMemoryDestinationStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryTables {
    pub studies: Vec<Stored<NewStudy>>,
    pub surveys: Vec<Stored<NewSurvey>>,
    pub device_settings: Vec<Stored<NewDeviceSettings>>,
    pub researchers: Vec<Stored<NewResearcher>>,
    pub study_researchers: Vec<Stored<StudyResearcher>>,
    pub participants: Vec<Stored<NewParticipant>>,
    pub chunk_registries: Vec<Stored<NewChunkRegistry>>,
    /// Every insert call in order, including ones that failed.
    pub insert_calls: Vec<InsertCall>,
    next_pk: PrimaryKey,
}

impl InMemoryTables {
    fn contains(&self, key: UniqueKey<'_>) -> bool {
        match key {
            UniqueKey::StudyName(name) => self.studies.iter().any(|s| s.record.name == name),
            UniqueKey::StudyObjectId(id) => self.studies.iter().any(|s| s.record.object_id == id),
            UniqueKey::SurveyObjectId(id) => self.surveys.iter().any(|s| s.record.object_id == id),
            UniqueKey::DeviceSettingsStudy(study_id) => self
                .device_settings
                .iter()
                .any(|s| s.record.study_id == study_id),
            UniqueKey::ResearcherUsername(username) => self
                .researchers
                .iter()
                .any(|r| r.record.username == username),
            UniqueKey::ResearcherAccessKeyId(id) => self
                .researchers
                .iter()
                .any(|r| r.record.access_key_id.as_deref() == Some(id)),
            UniqueKey::ParticipantPatientId(patient_id) => self
                .participants
                .iter()
                .any(|p| p.record.patient_id == patient_id),
            UniqueKey::ChunkPath(path) => self
                .chunk_registries
                .iter()
                .any(|c| c.record.chunk_path == path),
        }
    }

    fn has_pk(&self, kind: EntityKind, pk: PrimaryKey) -> bool {
        fn any<T>(rows: &[Stored<T>], pk: PrimaryKey) -> bool {
            rows.iter().any(|row| row.pk == pk)
        }
        match kind {
            EntityKind::Study => any(&self.studies, pk),
            EntityKind::Survey => any(&self.surveys, pk),
            EntityKind::DeviceSettings => any(&self.device_settings, pk),
            EntityKind::Researcher => any(&self.researchers, pk),
            EntityKind::StudyResearcher => any(&self.study_researchers, pk),
            EntityKind::Participant => any(&self.participants, pk),
            EntityKind::ChunkRegistry => any(&self.chunk_registries, pk),
        }
    }

    fn require(
        &self,
        entity: EntityKind,
        target: EntityKind,
        pk: PrimaryKey,
    ) -> Result<(), DestinationStoreError> {
        if self.has_pk(target, pk) {
            Ok(())
        } else {
            Err(DestinationStoreError::ForeignKeyViolation { entity, target, pk })
        }
    }

    fn check_unique<R: Record>(&self, record: &R) -> Result<(), DestinationStoreError> {
        match record.unique_keys().into_iter().find(|key| self.contains(*key)) {
            Some(key) => Err(DestinationStoreError::UniqueViolation {
                entity: R::KIND,
                field: key.field(),
                value: key.value(),
            }),
            None => Ok(()),
        }
    }

    pub fn counts(&self) -> TableCounts {
        TableCounts {
            studies: self.studies.len() as u64,
            surveys: self.surveys.len() as u64,
            device_settings: self.device_settings.len() as u64,
            researchers: self.researchers.len() as u64,
            participants: self.participants.len() as u64,
            chunk_registries: self.chunk_registries.len() as u64,
        }
    }
}

/// A row type of the in-memory schema.
trait Row: Clone {
    const TABLE: EntityKind;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>>;

    /// Checks the unique and foreign key constraints of the row.
    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError>;
}

impl Row for NewStudy {
    const TABLE: EntityKind = EntityKind::Study;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>> {
        &mut tables.studies
    }

    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError> {
        tables.check_unique(self)
    }
}

impl Row for NewSurvey {
    const TABLE: EntityKind = EntityKind::Survey;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>> {
        &mut tables.surveys
    }

    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError> {
        tables.require(Self::TABLE, EntityKind::Study, self.study_id)?;
        tables.check_unique(self)
    }
}

impl Row for NewDeviceSettings {
    const TABLE: EntityKind = EntityKind::DeviceSettings;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>> {
        &mut tables.device_settings
    }

    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError> {
        tables.require(Self::TABLE, EntityKind::Study, self.study_id)?;
        tables.check_unique(self)
    }
}

impl Row for NewResearcher {
    const TABLE: EntityKind = EntityKind::Researcher;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>> {
        &mut tables.researchers
    }

    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError> {
        tables.check_unique(self)
    }
}

impl Row for StudyResearcher {
    const TABLE: EntityKind = EntityKind::StudyResearcher;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>> {
        &mut tables.study_researchers
    }

    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError> {
        tables.require(Self::TABLE, EntityKind::Study, self.study_id)?;
        tables.require(Self::TABLE, EntityKind::Researcher, self.researcher_id)?;
        if tables.study_researchers.iter().any(|row| row.record == *self) {
            return Err(DestinationStoreError::UniqueViolation {
                entity: Self::TABLE,
                field: "study_id, researcher_id",
                value: format!("{}, {}", self.study_id, self.researcher_id),
            });
        }
        Ok(())
    }
}

impl Row for NewParticipant {
    const TABLE: EntityKind = EntityKind::Participant;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>> {
        &mut tables.participants
    }

    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError> {
        tables.require(Self::TABLE, EntityKind::Study, self.study_id)?;
        tables.check_unique(self)
    }
}

impl Row for NewChunkRegistry {
    const TABLE: EntityKind = EntityKind::ChunkRegistry;

    fn table(tables: &mut InMemoryTables) -> &mut Vec<Stored<Self>> {
        &mut tables.chunk_registries
    }

    fn check(&self, tables: &InMemoryTables) -> Result<(), DestinationStoreError> {
        tables.require(Self::TABLE, EntityKind::Study, self.study_id)?;
        tables.require(Self::TABLE, EntityKind::Participant, self.participant_id)?;
        if let Some(survey_id) = self.survey_id {
            tables.require(Self::TABLE, EntityKind::Survey, survey_id)?;
        }
        tables.check_unique(self)
    }
}

/// A destination store that keeps its tables in memory.
///
/// Enforces the same unique and foreign key constraints as the relational
/// schema, with the same all-or-nothing behavior per insert call. Two knobs
/// simulate a misbehaving database: inserts of a kind can be silently
/// dropped, or rejected outright.
#[derive(Debug, Default)]
pub struct InMemoryDestinationStore {
    tables: Mutex<InMemoryTables>,
    silently_dropped: HashSet<EntityKind>,
    failing: HashSet<EntityKind>,
}

impl InMemoryDestinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts inserts of `kind` without writing them.
    pub fn with_silently_dropped(mut self, kind: EntityKind) -> Self {
        self.silently_dropped.insert(kind);
        self
    }

    /// Rejects every insert of `kind`.
    pub fn with_failing_inserts(mut self, kind: EntityKind) -> Self {
        self.failing.insert(kind);
        self
    }

    /// Returns a copy of every table.
    pub async fn snapshot(&self) -> InMemoryTables {
        self.tables.lock().await.clone()
    }

    async fn insert_rows<T: Row>(&self, rows: &[T]) -> Result<(), DestinationStoreError> {
        let mut tables = self.tables.lock().await;
        tables.insert_calls.push(InsertCall {
            kind: T::TABLE,
            rows: rows.len(),
        });

        if rows.is_empty() || self.silently_dropped.contains(&T::TABLE) {
            return Ok(());
        }
        if self.failing.contains(&T::TABLE) {
            return Err(DestinationStoreError::Rejected(T::TABLE));
        }

        let mut staged = tables.clone();
        for row in rows {
            row.check(&staged)?;
            staged.next_pk += 1;
            let pk = staged.next_pk;
            T::table(&mut staged).push(Stored {
                pk,
                record: row.clone(),
            });
        }
        *tables = staged;
        Ok(())
    }
}

#[async_trait]
impl DestinationStore for InMemoryDestinationStore {
    async fn insert_studies(&self, studies: &[NewStudy]) -> Result<(), DestinationStoreError> {
        self.insert_rows(studies).await
    }

    async fn insert_surveys(&self, surveys: &[NewSurvey]) -> Result<(), DestinationStoreError> {
        self.insert_rows(surveys).await
    }

    async fn insert_device_settings(
        &self,
        settings: &[NewDeviceSettings],
    ) -> Result<(), DestinationStoreError> {
        self.insert_rows(settings).await
    }

    async fn insert_researchers(
        &self,
        researchers: &[NewResearcher],
    ) -> Result<(), DestinationStoreError> {
        self.insert_rows(researchers).await
    }

    async fn insert_study_researchers(
        &self,
        relations: &[StudyResearcher],
    ) -> Result<(), DestinationStoreError> {
        self.insert_rows(relations).await
    }

    async fn insert_participants(
        &self,
        participants: &[NewParticipant],
    ) -> Result<(), DestinationStoreError> {
        self.insert_rows(participants).await
    }

    async fn insert_chunk_registries(
        &self,
        chunks: &[NewChunkRegistry],
    ) -> Result<(), DestinationStoreError> {
        self.insert_rows(chunks).await
    }

    async fn find_study_by_name(
        &self,
        name: &str,
    ) -> Result<Option<StudyKey>, DestinationStoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .studies
            .iter()
            .find(|s| s.record.name == name)
            .map(|s| StudyKey {
                pk: s.pk,
                deleted: s.record.deleted,
            }))
    }

    async fn study_name(&self, pk: PrimaryKey) -> Result<Option<String>, DestinationStoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .studies
            .iter()
            .find(|s| s.pk == pk)
            .map(|s| s.record.name.clone()))
    }

    async fn find_survey_by_object_id(
        &self,
        object_id: &str,
    ) -> Result<Option<PrimaryKey>, DestinationStoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .surveys
            .iter()
            .find(|s| s.record.object_id == object_id)
            .map(|s| s.pk))
    }

    async fn find_participant_by_patient_id(
        &self,
        patient_id: &str,
    ) -> Result<Option<PrimaryKey>, DestinationStoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .participants
            .iter()
            .find(|p| p.record.patient_id == patient_id)
            .map(|p| p.pk))
    }

    async fn researcher_ids(&self) -> Result<HashMap<String, PrimaryKey>, DestinationStoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .researchers
            .iter()
            .map(|r| (r.record.username.clone(), r.pk))
            .collect())
    }

    async fn exists(&self, key: UniqueKey<'_>) -> Result<bool, DestinationStoreError> {
        Ok(self.tables.lock().await.contains(key))
    }

    async fn counts(&self) -> Result<TableCounts, DestinationStoreError> {
        Ok(self.tables.lock().await.counts())
    }
}
