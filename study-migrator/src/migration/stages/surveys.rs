use std::sync::Arc;

use study_migrator_shared::types::{EntityKind, NewSurvey, SourceSurvey, StudyKey, SurveyType};
use tracing::info;

use crate::errors::MigrationError;
use crate::migration::{Batch, Migrator};

/// Serializes a free-form JSON field to text.
pub(crate) fn encode_json(
    kind: EntityKind,
    id: &str,
    field: &'static str,
    value: &serde_json::Value,
) -> Result<String, MigrationError> {
    serde_json::to_string(value).map_err(|source| MigrationError::Serialization {
        kind,
        id: id.to_string(),
        field,
        source,
    })
}

fn build_survey(survey: &SourceSurvey, study: StudyKey) -> Result<NewSurvey, MigrationError> {
    let id = survey.id.as_str();
    let survey_type = survey
        .survey_type
        .parse::<SurveyType>()
        .map_err(|source| MigrationError::Validation {
            kind: EntityKind::Survey,
            label: id.to_string(),
            source,
        })?;

    Ok(NewSurvey {
        content: encode_json(EntityKind::Survey, id, "content", &survey.content)?,
        survey_type,
        settings: encode_json(EntityKind::Survey, id, "settings", &survey.settings)?,
        timings: encode_json(EntityKind::Survey, id, "timings", &survey.timings)?,
        object_id: id.to_string(),
        study_id: study.pk,
        deleted: study.deleted,
    })
}

impl Migrator {
    /// Stage 3: copies every survey listed by a migrated study.
    pub async fn migrate_surveys(&mut self) {
        info!("=== Migrating surveys ===");
        let source = Arc::clone(&self.source);
        let surveys = self.read_all(source.surveys()).await;

        let mut batch = Batch::new();
        let mut admitted = Vec::new();
        for survey in surveys {
            let Some(&study) = self.context.survey_owners.get(&survey.id) else {
                self.errors.record(MigrationError::MissingRequiredForeignKey {
                    kind: EntityKind::Survey,
                    id: survey.id.to_string(),
                });
                continue;
            };
            let Some(record) = self.errors.collect(build_survey(&survey, study)) else {
                continue;
            };
            let admit = batch.admit(record, self.destination.as_ref()).await;
            if self.errors.collect(admit).is_some() {
                admitted.push(survey.id);
            }
        }

        let inserted = self.destination.insert_surveys(batch.records()).await;
        self.check_insert(inserted);

        for survey_id in admitted {
            match self
                .destination
                .find_survey_by_object_id(survey_id.as_str())
                .await
            {
                Ok(Some(pk)) => {
                    self.context.surveys.insert(survey_id, pk);
                }
                Ok(None) => self.errors.record(MigrationError::ObjectCreation {
                    kind: EntityKind::Survey,
                    id: survey_id.to_string(),
                }),
                Err(e) => self.errors.record(e),
            }
        }

        info!("✓ Migrated {} surveys", self.context.surveys.len());
    }
}
