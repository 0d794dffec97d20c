use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::entity::{EntityKind, PrimaryKey, Record, UniqueKey};
use super::extended_json::ObjectId;
use super::researcher::{PASSWORD_MAX_LENGTH, SALT_MAX_LENGTH};
use crate::validation::{Validate, ValidationError, max_length, required_text};

pub const PATIENT_ID_MAX_LENGTH: usize = 8;
pub const DEVICE_ID_MAX_LENGTH: usize = 256;

/// A study participant as stored in the legacy document store, keyed by patient id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceUser {
    #[serde(rename = "_id")]
    pub patient_id: String,
    pub study_id: ObjectId,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub os_type: Option<String>,
    pub password: String,
    pub salt: String,
}

/// Operating system of a participant's registered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OsType {
    Android,
    Ios,
    /// No device registered yet.
    #[default]
    Unset,
}

impl OsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Android => "ANDROID",
            OsType::Ios => "IOS",
            OsType::Unset => "",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANDROID" => Ok(OsType::Android),
            "IOS" => Ok(OsType::Ios),
            "" => Ok(OsType::Unset),
            other => Err(ValidationError::InvalidChoice {
                field: "os_type",
                value: other.to_string(),
            }),
        }
    }
}

/// A participant row ready to be inserted into the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub patient_id: String,
    pub device_id: String,
    pub os_type: OsType,
    pub study_id: PrimaryKey,
    pub password: String,
    pub salt: String,
    pub deleted: bool,
}

impl Validate for NewParticipant {
    fn validate(&self) -> Result<(), ValidationError> {
        required_text("patient_id", &self.patient_id, PATIENT_ID_MAX_LENGTH)?;
        max_length("device_id", &self.device_id, DEVICE_ID_MAX_LENGTH)?;
        required_text("password", &self.password, PASSWORD_MAX_LENGTH)?;
        required_text("salt", &self.salt, SALT_MAX_LENGTH)
    }
}

impl Record for NewParticipant {
    const KIND: EntityKind = EntityKind::Participant;

    fn label(&self) -> String {
        self.patient_id.clone()
    }

    fn unique_keys(&self) -> Vec<UniqueKey<'_>> {
        vec![UniqueKey::ParticipantPatientId(&self.patient_id)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_type_parsing() {
        assert_eq!("ANDROID".parse::<OsType>(), Ok(OsType::Android));
        assert_eq!("IOS".parse::<OsType>(), Ok(OsType::Ios));
        assert_eq!("".parse::<OsType>(), Ok(OsType::Unset));
        assert!("WINDOWS".parse::<OsType>().is_err());
    }

    #[test]
    fn test_patient_id_length() {
        let participant = NewParticipant {
            patient_id: "abcdefghi".to_string(),
            device_id: String::new(),
            os_type: OsType::Unset,
            study_id: 1,
            password: "hash".to_string(),
            salt: "salt".to_string(),
            deleted: false,
        };
        assert!(matches!(
            participant.validate(),
            Err(ValidationError::TooLong { field: "patient_id", max: 8, actual: 9 })
        ));
    }
}
