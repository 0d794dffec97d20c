use serde::{Deserialize, Serialize};

use super::entity::{EntityKind, PrimaryKey, Record, UniqueKey};
use super::extended_json::ObjectId;
use crate::validation::{Validate, ValidationError, non_negative, required};

/// The configuration pushed to every participant device of a study.
///
/// These fields are copied from the source document to the destination row
/// unchanged, so both sides share this struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSettingsFields {
    // sensors
    pub accelerometer: bool,
    pub gps: bool,
    pub calls: bool,
    pub texts: bool,
    pub wifi: bool,
    pub bluetooth: bool,
    pub power_state: bool,
    pub proximity: bool,
    pub gyro: bool,
    pub magnetometer: bool,
    pub devicemotion: bool,
    pub reachability: bool,
    pub allow_upload_over_cellular_data: bool,

    // timers
    pub accelerometer_off_duration_seconds: i64,
    pub accelerometer_on_duration_seconds: i64,
    pub bluetooth_on_duration_seconds: i64,
    pub bluetooth_total_duration_seconds: i64,
    pub bluetooth_global_offset_seconds: i64,
    pub check_for_new_surveys_frequency_seconds: i64,
    pub create_new_data_files_frequency_seconds: i64,
    pub gps_off_duration_seconds: i64,
    pub gps_on_duration_seconds: i64,
    pub seconds_before_auto_logout: i64,
    pub upload_data_files_frequency_seconds: i64,
    pub voice_recording_max_time_length_seconds: i64,
    pub wifi_log_frequency_seconds: i64,
    pub gyro_off_duration_seconds: i64,
    pub gyro_on_duration_seconds: i64,
    pub magnetometer_off_duration_seconds: i64,
    pub magnetometer_on_duration_seconds: i64,
    pub devicemotion_off_duration_seconds: i64,
    pub devicemotion_on_duration_seconds: i64,

    // app text
    pub about_page_text: String,
    pub call_clinician_button_text: String,
    pub consent_form_text: String,
    pub survey_submit_success_toast_text: String,
}

impl DeviceSettingsFields {
    /// Name and value of every timer field, in schema order.
    pub fn durations(&self) -> [(&'static str, i64); 19] {
        [
            ("accelerometer_off_duration_seconds", self.accelerometer_off_duration_seconds),
            ("accelerometer_on_duration_seconds", self.accelerometer_on_duration_seconds),
            ("bluetooth_on_duration_seconds", self.bluetooth_on_duration_seconds),
            ("bluetooth_total_duration_seconds", self.bluetooth_total_duration_seconds),
            ("bluetooth_global_offset_seconds", self.bluetooth_global_offset_seconds),
            (
                "check_for_new_surveys_frequency_seconds",
                self.check_for_new_surveys_frequency_seconds,
            ),
            (
                "create_new_data_files_frequency_seconds",
                self.create_new_data_files_frequency_seconds,
            ),
            ("gps_off_duration_seconds", self.gps_off_duration_seconds),
            ("gps_on_duration_seconds", self.gps_on_duration_seconds),
            ("seconds_before_auto_logout", self.seconds_before_auto_logout),
            ("upload_data_files_frequency_seconds", self.upload_data_files_frequency_seconds),
            (
                "voice_recording_max_time_length_seconds",
                self.voice_recording_max_time_length_seconds,
            ),
            ("wifi_log_frequency_seconds", self.wifi_log_frequency_seconds),
            ("gyro_off_duration_seconds", self.gyro_off_duration_seconds),
            ("gyro_on_duration_seconds", self.gyro_on_duration_seconds),
            ("magnetometer_off_duration_seconds", self.magnetometer_off_duration_seconds),
            ("magnetometer_on_duration_seconds", self.magnetometer_on_duration_seconds),
            ("devicemotion_off_duration_seconds", self.devicemotion_off_duration_seconds),
            ("devicemotion_on_duration_seconds", self.devicemotion_on_duration_seconds),
        ]
    }
}

/// Device settings as stored in the legacy document store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDeviceSettings {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(flatten)]
    pub fields: DeviceSettingsFields,
    #[serde(default)]
    pub consent_sections: serde_json::Value,
}

/// A device settings row ready to be inserted into the destination store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeviceSettings {
    pub fields: DeviceSettingsFields,
    pub consent_sections: String,
    pub study_id: PrimaryKey,
    pub deleted: bool,
}

impl Validate for NewDeviceSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.fields.durations() {
            non_negative(field, value)?;
        }
        required("consent_sections", &self.consent_sections)
    }
}

impl Record for NewDeviceSettings {
    const KIND: EntityKind = EntityKind::DeviceSettings;

    fn label(&self) -> String {
        format!("of study {}", self.study_id)
    }

    fn unique_keys(&self) -> Vec<UniqueKey<'_>> {
        vec![UniqueKey::DeviceSettingsStudy(self.study_id)]
    }
}
