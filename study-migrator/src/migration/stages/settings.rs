use std::sync::Arc;

use study_migrator_shared::types::{EntityKind, NewDeviceSettings, SourceDeviceSettings, StudyKey};
use tracing::info;

use super::surveys::encode_json;
use crate::errors::MigrationError;
use crate::migration::{Batch, Migrator};

fn build_settings(
    settings: &SourceDeviceSettings,
    study: StudyKey,
) -> Result<NewDeviceSettings, MigrationError> {
    Ok(NewDeviceSettings {
        fields: settings.fields.clone(),
        consent_sections: encode_json(
            EntityKind::DeviceSettings,
            settings.id.as_str(),
            "consent_sections",
            &settings.consent_sections,
        )?,
        study_id: study.pk,
        deleted: study.deleted,
    })
}

impl Migrator {
    /// Stage 4: copies every device settings document listed by a migrated
    /// study.
    pub async fn migrate_settings(&mut self) {
        info!("=== Migrating device settings ===");
        let source = Arc::clone(&self.source);
        let all_settings = self.read_all(source.device_settings()).await;

        let mut batch = Batch::new();
        for settings in all_settings {
            let Some(&study) = self.context.settings_owners.get(&settings.id) else {
                self.errors.record(MigrationError::MissingRequiredForeignKey {
                    kind: EntityKind::DeviceSettings,
                    id: settings.id.to_string(),
                });
                continue;
            };
            let Some(record) = self.errors.collect(build_settings(&settings, study)) else {
                continue;
            };
            let admit = batch.admit(record, self.destination.as_ref()).await;
            self.errors.collect(admit);
        }

        let inserted = self.destination.insert_device_settings(batch.records()).await;
        if self.check_insert(inserted) {
            info!("✓ Migrated {} device settings", batch.len());
        }
    }
}
