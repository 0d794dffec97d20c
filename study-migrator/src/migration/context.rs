use std::collections::HashMap;

use study_migrator_shared::types::{ObjectId, PrimaryKey, StudyKey};

/// What a migrated study points at in the source, captured before its
/// referents are migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyReferents {
    pub name: String,
    pub study: StudyKey,
    pub surveys: Vec<ObjectId>,
    pub admins: Vec<String>,
    pub device_settings: Option<ObjectId>,
}

/// A study ⇄ researcher pair waiting for the researcher to be migrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStudyResearcher {
    pub study_id: PrimaryKey,
    pub username: String,
}

/// Lookup tables built by earlier stages and read by later ones.
///
/// Only studies that made it into the destination appear here, so anything
/// that depends on a study that failed is left without a parent.
#[derive(Debug, Default)]
pub struct MigrationContext {
    /// Source study id to the migrated study.
    pub studies: HashMap<ObjectId, StudyKey>,
    pub study_referents: Vec<StudyReferents>,
    /// Source survey id to the study that lists it.
    pub survey_owners: HashMap<ObjectId, StudyKey>,
    /// Source device settings id to the study that lists it.
    pub settings_owners: HashMap<ObjectId, StudyKey>,
    pub pending_study_researchers: Vec<PendingStudyResearcher>,
    /// Source survey id to the migrated survey.
    pub surveys: HashMap<ObjectId, PrimaryKey>,
    /// Patient id to the migrated participant.
    pub participants: HashMap<String, PrimaryKey>,
}
