use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entity::{EntityKind, PrimaryKey, Record, UniqueKey};
use super::extended_json::{ObjectId, date};
use crate::validation::{Validate, ValidationError, max_length, required_text};

pub const CHUNK_PATH_MAX_LENGTH: usize = 256;
pub const CHUNK_HASH_MAX_LENGTH: usize = 25;

/// A registry entry for one uploaded data file chunk, as stored in the
/// legacy document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceChunk {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub study_id: ObjectId,
    pub user_id: String,
    #[serde(default)]
    pub survey_id: Option<ObjectId>,
    pub chunk_path: String,
    #[serde(default)]
    pub chunk_hash: Option<String>,
    pub data_type: String,
    #[serde(with = "date")]
    pub time_bin: DateTime<Utc>,
    #[serde(default)]
    pub is_chunkable: bool,
}

/// The data streams a participant device uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Accelerometer,
    Bluetooth,
    Calls,
    Gps,
    Identifiers,
    AndroidLog,
    IosLog,
    PowerState,
    SurveyAnswers,
    SurveyTimings,
    Texts,
    AudioRecordings,
    Wifi,
    Proximity,
    Gyro,
    Magnetometer,
    DeviceMotion,
    Reachability,
    ImageSurvey,
}

impl DataType {
    pub const ALL: [DataType; 19] = [
        DataType::Accelerometer,
        DataType::Bluetooth,
        DataType::Calls,
        DataType::Gps,
        DataType::Identifiers,
        DataType::AndroidLog,
        DataType::IosLog,
        DataType::PowerState,
        DataType::SurveyAnswers,
        DataType::SurveyTimings,
        DataType::Texts,
        DataType::AudioRecordings,
        DataType::Wifi,
        DataType::Proximity,
        DataType::Gyro,
        DataType::Magnetometer,
        DataType::DeviceMotion,
        DataType::Reachability,
        DataType::ImageSurvey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Accelerometer => "accelerometer",
            DataType::Bluetooth => "bluetooth",
            DataType::Calls => "calls",
            DataType::Gps => "gps",
            DataType::Identifiers => "identifiers",
            DataType::AndroidLog => "app_log",
            DataType::IosLog => "ios_log",
            DataType::PowerState => "power_state",
            DataType::SurveyAnswers => "survey_answers",
            DataType::SurveyTimings => "survey_timings",
            DataType::Texts => "texts",
            DataType::AudioRecordings => "audio_recordings",
            DataType::Wifi => "wifi",
            DataType::Proximity => "proximity",
            DataType::Gyro => "gyro",
            DataType::Magnetometer => "magnetometer",
            DataType::DeviceMotion => "devicemotion",
            DataType::Reachability => "reachability",
            DataType::ImageSurvey => "image_survey",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidChoice {
                field: "data_type",
                value: s.to_string(),
            })
    }
}

/// A chunk registry row ready to be inserted into the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChunkRegistry {
    pub is_chunkable: bool,
    pub chunk_path: String,
    pub chunk_hash: String,
    pub data_type: DataType,
    pub time_bin: DateTime<Utc>,
    pub study_id: PrimaryKey,
    pub participant_id: PrimaryKey,
    pub survey_id: Option<PrimaryKey>,
    pub deleted: bool,
}

impl Validate for NewChunkRegistry {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("chunk_path", &self.chunk_path, CHUNK_PATH_MAX_LENGTH)?;
        max_length("chunk_hash", &self.chunk_hash, CHUNK_HASH_MAX_LENGTH)
    }
}

impl Record for NewChunkRegistry {
    const KIND: EntityKind = EntityKind::ChunkRegistry;

    fn label(&self) -> String {
        self.chunk_path.clone()
    }

    fn unique_keys(&self) -> Vec<UniqueKey<'_>> {
        vec![UniqueKey::ChunkPath(&self.chunk_path)]
    }
}
