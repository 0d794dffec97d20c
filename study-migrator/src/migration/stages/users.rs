use std::sync::Arc;

use study_migrator_shared::types::{EntityKind, NewParticipant, OsType, SourceUser};
use tracing::info;

use crate::errors::MigrationError;
use crate::migration::{Batch, MigrationContext, Migrator};

fn build_participant(
    user: &SourceUser,
    context: &MigrationContext,
) -> Result<NewParticipant, MigrationError> {
    let study = context
        .studies
        .get(&user.study_id)
        .ok_or_else(|| MigrationError::Referential {
            kind: EntityKind::Study,
            id: user.study_id.to_string(),
            referrer: format!("User {}", user.patient_id),
        })?;

    let os_type = user
        .os_type
        .as_deref()
        .unwrap_or_default()
        .parse::<OsType>()
        .map_err(|source| MigrationError::Validation {
            kind: EntityKind::Participant,
            label: user.patient_id.clone(),
            source,
        })?;

    Ok(NewParticipant {
        patient_id: user.patient_id.clone(),
        device_id: user.device_id.clone().unwrap_or_default(),
        os_type,
        study_id: study.pk,
        password: user.password.clone(),
        salt: user.salt.clone(),
        deleted: study.deleted,
    })
}

impl Migrator {
    /// Stage 6: copies every user of a migrated study as a participant.
    pub async fn migrate_users(&mut self) {
        info!("=== Migrating users ===");
        let source = Arc::clone(&self.source);
        let users = self.read_all(source.users()).await;

        let mut batch = Batch::new();
        let mut admitted = Vec::new();
        for user in users {
            let Some(record) = self.errors.collect(build_participant(&user, &self.context)) else {
                continue;
            };
            let admit = batch.admit(record, self.destination.as_ref()).await;
            if self.errors.collect(admit).is_some() {
                admitted.push(user.patient_id);
            }
        }

        let inserted = self.destination.insert_participants(batch.records()).await;
        self.check_insert(inserted);

        for patient_id in admitted {
            match self
                .destination
                .find_participant_by_patient_id(&patient_id)
                .await
            {
                Ok(Some(pk)) => {
                    self.context.participants.insert(patient_id, pk);
                }
                Ok(None) => self.errors.record(MigrationError::ObjectCreation {
                    kind: EntityKind::Participant,
                    id: patient_id,
                }),
                Err(e) => self.errors.record(e),
            }
        }

        info!("✓ Migrated {} participants", self.context.participants.len());
    }
}
