//! Source document fixtures shaped like `mongoexport` output.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use study_migrator::Migrator;
use study_migrator_repository::{Collection, InMemoryDestinationStore, InMemorySourceStore};

pub const ENCRYPTION_KEY: &str = "abcdefghijklmnopqrstuvwxyz012345";

/// A 24-hex-digit object id derived from `n`.
pub fn oid(n: u64) -> String {
    format!("{:024x}", n)
}

pub fn study_doc(
    id: &str,
    name: &str,
    deleted: bool,
    surveys: &[&str],
    admins: &[&str],
    device_settings: Option<&str>,
) -> Value {
    json!({
        "_id": {"$oid": id},
        "name": name,
        "encryption_key": ENCRYPTION_KEY,
        "deleted": deleted,
        "surveys": surveys.iter().map(|s| json!({"$oid": s})).collect::<Vec<_>>(),
        "admins": admins,
        "device_settings": device_settings.map(|s| json!({"$oid": s})),
    })
}

pub fn survey_doc(id: &str) -> Value {
    json!({
        "_id": {"$oid": id},
        "content": [{"question_id": "q1", "question_text": "How did you sleep?", "question_type": "free_response"}],
        "survey_type": "tracking_survey",
        "settings": {"trigger_on_first_download": false},
        "timings": [[], [32400], [], [], [], [], []],
    })
}

pub fn settings_doc(id: &str) -> Value {
    json!({
        "_id": {"$oid": id},
        "accelerometer": true,
        "gps": true,
        "calls": true,
        "texts": true,
        "wifi": true,
        "bluetooth": false,
        "power_state": true,
        "proximity": false,
        "gyro": false,
        "magnetometer": false,
        "devicemotion": false,
        "reachability": true,
        "allow_upload_over_cellular_data": false,
        "accelerometer_off_duration_seconds": 10,
        "accelerometer_on_duration_seconds": 10,
        "bluetooth_on_duration_seconds": 60,
        "bluetooth_total_duration_seconds": 300,
        "bluetooth_global_offset_seconds": 0,
        "check_for_new_surveys_frequency_seconds": 21600,
        "create_new_data_files_frequency_seconds": 900,
        "gps_off_duration_seconds": 600,
        "gps_on_duration_seconds": 60,
        "seconds_before_auto_logout": 600,
        "upload_data_files_frequency_seconds": 3600,
        "voice_recording_max_time_length_seconds": 240,
        "wifi_log_frequency_seconds": 300,
        "gyro_off_duration_seconds": 600,
        "gyro_on_duration_seconds": 60,
        "magnetometer_off_duration_seconds": 600,
        "magnetometer_on_duration_seconds": 60,
        "devicemotion_off_duration_seconds": 600,
        "devicemotion_on_duration_seconds": 60,
        "about_page_text": "About this study",
        "call_clinician_button_text": "Call My Clinician",
        "consent_form_text": "I agree",
        "survey_submit_success_toast_text": "Thank you",
        "consent_sections": {"welcome": {"text": "", "more": ""}},
    })
}

pub fn admin_doc(username: &str) -> Value {
    json!({
        "_id": username,
        "system_admin": false,
        "password": "cGFzc3dvcmQ=",
        "salt": "c2FsdA==",
        "access_key_id": null,
        "access_key_secret": null,
        "access_key_secret_salt": null,
    })
}

pub fn user_doc(patient_id: &str, study_id: &str) -> Value {
    json!({
        "_id": patient_id,
        "study_id": {"$oid": study_id},
        "device_id": null,
        "os_type": "IOS",
        "password": "cGFzc3dvcmQ=",
        "salt": "c2FsdA==",
    })
}

pub fn chunk_doc(n: u64, study_id: &str, user_id: &str, survey_id: Option<&str>) -> Value {
    json!({
        "_id": {"$oid": oid(1_000_000 + n)},
        "study_id": {"$oid": study_id},
        "user_id": user_id,
        "survey_id": survey_id.map(|s| json!({"$oid": s})),
        "chunk_path": format!("{}/{}/gps/{}.csv", study_id, user_id, 1_488_369_600 + n * 3600),
        "chunk_hash": null,
        "data_type": "gps",
        "time_bin": {"$date": {"$numberLong": ((1_488_369_600 + n * 3600) * 1000).to_string()}},
        "is_chunkable": true,
    })
}

/// A study with one survey, one settings document, one admin and one user.
pub fn single_study_source(deleted: bool) -> InMemorySourceStore {
    let study = oid(1);
    let survey = oid(2);
    let settings = oid(3);
    InMemorySourceStore::new()
        .with_document(
            Collection::Studies,
            study_doc(&study, "A", deleted, &[&survey], &["bob"], Some(&settings)),
        )
        .with_document(Collection::Surveys, survey_doc(&survey))
        .with_document(Collection::DeviceSettings, settings_doc(&settings))
        .with_document(Collection::Admins, admin_doc("bob"))
        .with_document(Collection::Users, user_doc("abc12345", &study))
}

pub fn migrator(
    source: InMemorySourceStore,
    destination: &Arc<InMemoryDestinationStore>,
) -> Migrator {
    Migrator::new(Arc::new(source), destination.clone())
}
