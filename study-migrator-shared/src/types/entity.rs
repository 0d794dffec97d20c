use std::fmt;

use crate::validation::Validate;

/// Primary key of a row in the destination store.
pub type PrimaryKey = i64;

/// The entity kinds moved by the migrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Study,
    Survey,
    DeviceSettings,
    Researcher,
    StudyResearcher,
    Participant,
    ChunkRegistry,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Study => "Study",
            EntityKind::Survey => "Survey",
            EntityKind::DeviceSettings => "DeviceSettings",
            EntityKind::Researcher => "Admin",
            EntityKind::StudyResearcher => "StudyAdmin",
            EntityKind::Participant => "User",
            EntityKind::ChunkRegistry => "ChunkRegistry",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that must be unique in the destination store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey<'a> {
    StudyName(&'a str),
    StudyObjectId(&'a str),
    SurveyObjectId(&'a str),
    DeviceSettingsStudy(PrimaryKey),
    ResearcherUsername(&'a str),
    ResearcherAccessKeyId(&'a str),
    ParticipantPatientId(&'a str),
    ChunkPath(&'a str),
}

impl UniqueKey<'_> {
    pub fn entity(&self) -> EntityKind {
        match self {
            UniqueKey::StudyName(_) | UniqueKey::StudyObjectId(_) => EntityKind::Study,
            UniqueKey::SurveyObjectId(_) => EntityKind::Survey,
            UniqueKey::DeviceSettingsStudy(_) => EntityKind::DeviceSettings,
            UniqueKey::ResearcherUsername(_) | UniqueKey::ResearcherAccessKeyId(_) => {
                EntityKind::Researcher
            }
            UniqueKey::ParticipantPatientId(_) => EntityKind::Participant,
            UniqueKey::ChunkPath(_) => EntityKind::ChunkRegistry,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            UniqueKey::StudyName(_) => "name",
            UniqueKey::StudyObjectId(_) | UniqueKey::SurveyObjectId(_) => "object_id",
            UniqueKey::DeviceSettingsStudy(_) => "study_id",
            UniqueKey::ResearcherUsername(_) => "username",
            UniqueKey::ResearcherAccessKeyId(_) => "access_key_id",
            UniqueKey::ParticipantPatientId(_) => "patient_id",
            UniqueKey::ChunkPath(_) => "chunk_path",
        }
    }

    pub fn value(&self) -> String {
        match self {
            UniqueKey::StudyName(v)
            | UniqueKey::StudyObjectId(v)
            | UniqueKey::SurveyObjectId(v)
            | UniqueKey::ResearcherUsername(v)
            | UniqueKey::ResearcherAccessKeyId(v)
            | UniqueKey::ParticipantPatientId(v)
            | UniqueKey::ChunkPath(v) => v.to_string(),
            UniqueKey::DeviceSettingsStudy(pk) => pk.to_string(),
        }
    }
}

/// A destination record that goes through validation before a bulk insert.
pub trait Record: Validate {
    const KIND: EntityKind;

    /// Human-readable identifier used in logs and error messages.
    fn label(&self) -> String;

    /// Values the destination store enforces uniqueness on.
    fn unique_keys(&self) -> Vec<UniqueKey<'_>>;
}
