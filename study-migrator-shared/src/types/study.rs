use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, PrimaryKey, Record, UniqueKey};
use super::extended_json::ObjectId;
use crate::validation::{Validate, ValidationError, exact_length, required_text};

pub const STUDY_NAME_MAX_LENGTH: usize = 64;
pub const ENCRYPTION_KEY_LENGTH: usize = 32;
pub const OBJECT_ID_LENGTH: usize = 24;

/// A study as stored in the legacy document store.
///
/// Studies are the parents of every other entity: they list the surveys,
/// admins and device settings attached to them by identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceStudy {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub encryption_key: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub surveys: Vec<ObjectId>,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub device_settings: Option<ObjectId>,
}

/// A study row ready to be inserted into the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudy {
    pub name: String,
    pub encryption_key: String,
    pub object_id: String,
    pub deleted: bool,
}

impl From<&SourceStudy> for NewStudy {
    fn from(study: &SourceStudy) -> Self {
        Self {
            name: study.name.clone(),
            encryption_key: study.encryption_key.clone(),
            object_id: study.id.to_string(),
            deleted: study.deleted,
        }
    }
}

impl Validate for NewStudy {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("name", &self.name, STUDY_NAME_MAX_LENGTH)?;
        exact_length("encryption_key", &self.encryption_key, ENCRYPTION_KEY_LENGTH)?;
        exact_length("object_id", &self.object_id, OBJECT_ID_LENGTH)
    }
}

impl Record for NewStudy {
    const KIND: EntityKind = EntityKind::Study;

    fn label(&self) -> String {
        self.name.clone()
    }

    fn unique_keys(&self) -> Vec<UniqueKey<'_>> {
        vec![
            UniqueKey::StudyName(&self.name),
            UniqueKey::StudyObjectId(&self.object_id),
        ]
    }
}

/// What dependents need to know about a migrated study: where it lives and
/// whether it is soft-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyKey {
    pub pk: PrimaryKey,
    pub deleted: bool,
}
