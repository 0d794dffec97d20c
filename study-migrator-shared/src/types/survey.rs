use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entity::{EntityKind, PrimaryKey, Record, UniqueKey};
use super::extended_json::ObjectId;
use super::study::OBJECT_ID_LENGTH;
use crate::validation::{Validate, ValidationError, exact_length, required};

/// A survey as stored in the legacy document store.
///
/// `content`, `settings` and `timings` are free-form JSON authored in the
/// survey designer and are carried over verbatim as serialized text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSurvey {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub content: serde_json::Value,
    pub survey_type: String,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub timings: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyType {
    Audio,
    Tracking,
}

impl SurveyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyType::Audio => "audio_survey",
            SurveyType::Tracking => "tracking_survey",
        }
    }
}

impl fmt::Display for SurveyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurveyType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio_survey" => Ok(SurveyType::Audio),
            "tracking_survey" => Ok(SurveyType::Tracking),
            other => Err(ValidationError::InvalidChoice {
                field: "survey_type",
                value: other.to_string(),
            }),
        }
    }
}

/// A survey row ready to be inserted into the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSurvey {
    pub content: String,
    pub survey_type: SurveyType,
    pub settings: String,
    pub timings: String,
    pub object_id: String,
    pub study_id: PrimaryKey,
    pub deleted: bool,
}

impl Validate for NewSurvey {
    fn validate(&self) -> Result<(), ValidationError> {
        required("content", &self.content)?;
        required("settings", &self.settings)?;
        required("timings", &self.timings)?;
        exact_length("object_id", &self.object_id, OBJECT_ID_LENGTH)
    }
}

impl Record for NewSurvey {
    const KIND: EntityKind = EntityKind::Survey;

    fn label(&self) -> String {
        self.object_id.clone()
    }

    fn unique_keys(&self) -> Vec<UniqueKey<'_>> {
        vec![UniqueKey::SurveyObjectId(&self.object_id)]
    }
}
