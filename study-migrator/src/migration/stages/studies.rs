use std::sync::Arc;

use study_migrator_shared::types::{EntityKind, NewStudy};
use tracing::info;

use crate::errors::MigrationError;
use crate::migration::{Batch, Migrator, PendingStudyResearcher, StudyReferents};

impl Migrator {
    /// Stage 1: copies every study and records what each one references.
    ///
    /// A study is looked up by name once the bulk insert is done; one that
    /// cannot be found is reported and left out of every lookup table.
    pub async fn migrate_studies(&mut self) {
        info!("=== Migrating studies ===");
        let source = Arc::clone(&self.source);
        let studies = self.read_all(source.studies()).await;

        let mut batch = Batch::new();
        let mut admitted = Vec::new();
        for study in studies {
            let admit = batch
                .admit(NewStudy::from(&study), self.destination.as_ref())
                .await;
            if self.errors.collect(admit).is_some() {
                admitted.push(study);
            }
        }

        let inserted = self.destination.insert_studies(batch.records()).await;
        self.check_insert(inserted);

        for study in admitted {
            let found = match self.destination.find_study_by_name(&study.name).await {
                Ok(found) => found,
                Err(e) => {
                    self.errors.record(e);
                    continue;
                }
            };
            let Some(key) = found else {
                self.errors.record(MigrationError::ObjectCreation {
                    kind: EntityKind::Study,
                    id: study.name,
                });
                continue;
            };

            self.context.studies.insert(study.id.clone(), key);
            self.context.study_referents.push(StudyReferents {
                name: study.name,
                study: key,
                surveys: study.surveys,
                admins: study.admins,
                device_settings: study.device_settings,
            });
        }

        info!("✓ Migrated {} studies", self.context.studies.len());
    }

    /// Stage 2: maps every survey and device settings document to the study
    /// that lists it, and queues the study's admins for stage 5.
    pub async fn remap_study_relationships(&mut self) {
        info!("=== Remapping study relationships ===");
        let referents = self.context.study_referents.clone();

        for study in referents {
            let referrer = format!("Study {}", study.name);

            for survey_id in study.surveys {
                match self.source.find_survey(&survey_id).await {
                    Ok(Some(_)) => {
                        self.context.survey_owners.insert(survey_id, study.study);
                    }
                    Ok(None) => self.errors.record(MigrationError::Referential {
                        kind: EntityKind::Survey,
                        id: survey_id.to_string(),
                        referrer: referrer.clone(),
                    }),
                    Err(e) => self.errors.record(e),
                }
            }

            for username in study.admins {
                self.context
                    .pending_study_researchers
                    .push(PendingStudyResearcher {
                        study_id: study.study.pk,
                        username,
                    });
            }

            let Some(settings_id) = study.device_settings else {
                continue;
            };
            match self.source.find_device_settings(&settings_id).await {
                Ok(Some(_)) => {
                    self.context.settings_owners.insert(settings_id, study.study);
                }
                Ok(None) => self.errors.record(MigrationError::Referential {
                    kind: EntityKind::DeviceSettings,
                    id: settings_id.to_string(),
                    referrer,
                }),
                Err(e) => self.errors.record(e),
            }
        }

        info!(
            "✓ Remapped {} surveys, {} device settings and {} study admins",
            self.context.survey_owners.len(),
            self.context.settings_owners.len(),
            self.context.pending_study_researchers.len()
        );
    }
}
