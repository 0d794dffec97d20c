use std::sync::Arc;

use futures::StreamExt;
use study_migrator_repository::Collection;
use study_migrator_shared::types::{DataType, EntityKind, NewChunkRegistry, SourceChunk};
use tracing::{debug, info};

use crate::errors::MigrationError;
use crate::migration::{Batch, MigrationContext, Migrator};

fn build_chunk(
    chunk: &SourceChunk,
    context: &MigrationContext,
) -> Result<NewChunkRegistry, MigrationError> {
    let referrer = || format!("ChunkRegistry {}", chunk.id);

    let study = context
        .studies
        .get(&chunk.study_id)
        .ok_or_else(|| MigrationError::Referential {
            kind: EntityKind::Study,
            id: chunk.study_id.to_string(),
            referrer: referrer(),
        })?;
    let participant_id = context
        .participants
        .get(&chunk.user_id)
        .ok_or_else(|| MigrationError::Referential {
            kind: EntityKind::Participant,
            id: chunk.user_id.clone(),
            referrer: referrer(),
        })?;
    let survey_id = match &chunk.survey_id {
        None => None,
        Some(survey_id) => Some(*context.surveys.get(survey_id).ok_or_else(|| {
            MigrationError::Referential {
                kind: EntityKind::Survey,
                id: survey_id.to_string(),
                referrer: referrer(),
            }
        })?),
    };

    let data_type = chunk
        .data_type
        .parse::<DataType>()
        .map_err(|source| MigrationError::Validation {
            kind: EntityKind::ChunkRegistry,
            label: chunk.chunk_path.clone(),
            source,
        })?;

    Ok(NewChunkRegistry {
        is_chunkable: chunk.is_chunkable,
        chunk_path: chunk.chunk_path.clone(),
        chunk_hash: chunk.chunk_hash.clone().unwrap_or_default(),
        data_type,
        time_bin: chunk.time_bin,
        study_id: study.pk,
        participant_id: *participant_id,
        survey_id,
        deleted: study.deleted,
    })
}

impl Migrator {
    /// Stage 7: streams the chunk registry and copies it one batch at a time.
    ///
    /// Each batch takes up to `chunk_batch_size` source documents, failed
    /// ones included, and ends in one bulk insert when anything in it was
    /// admitted.
    pub async fn migrate_chunk_registries(&mut self) {
        info!("=== Migrating chunk registries ===");
        let source = Arc::clone(&self.source);

        let total = match source.count(Collection::ChunkRegistries).await {
            Ok(total) => total,
            Err(e) => {
                self.errors.record(e);
                0
            }
        };
        let batch_count = total.div_ceil(self.chunk_batch_size as u64);

        let mut chunks = source.chunk_registries();
        let mut batch_number = 0u64;
        let mut migrated = 0usize;
        loop {
            let mut batch = Batch::new();
            let mut consumed = 0;
            while consumed < self.chunk_batch_size {
                let Some(chunk) = chunks.next().await else {
                    break;
                };
                consumed += 1;

                let record = match chunk {
                    Ok(chunk) => build_chunk(&chunk, &self.context),
                    Err(e) => Err(e.into()),
                };
                let Some(record) = self.errors.collect(record) else {
                    continue;
                };
                let admit = batch.admit(record, self.destination.as_ref()).await;
                self.errors.collect(admit);
            }

            if consumed == 0 {
                break;
            }
            batch_number += 1;

            if !batch.is_empty() {
                let inserted = self.destination.insert_chunk_registries(batch.records()).await;
                if self.check_insert(inserted) {
                    migrated += batch.len();
                }
            }
            debug!(
                "Chunk batch {}/{}: {} read, {} inserted",
                batch_number,
                batch_count,
                consumed,
                batch.len()
            );

            if consumed < self.chunk_batch_size {
                break;
            }
        }

        info!("✓ Migrated {} chunk registries", migrated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use study_migrator_shared::types::{ObjectId, StudyKey};

    fn context() -> MigrationContext {
        let mut context = MigrationContext::default();
        context.studies.insert(
            ObjectId::from("5873fe38644ad7557b168e43"),
            StudyKey { pk: 1, deleted: true },
        );
        context.participants.insert("abc12345".to_string(), 2);
        context
            .surveys
            .insert(ObjectId::from("5873fe38644ad7557b168e45"), 3);
        context
    }

    fn source_chunk(survey_id: Option<&str>) -> SourceChunk {
        SourceChunk {
            id: ObjectId::from("5873fe38644ad7557b168e50"),
            study_id: ObjectId::from("5873fe38644ad7557b168e43"),
            user_id: "abc12345".to_string(),
            survey_id: survey_id.map(ObjectId::from),
            chunk_path: "5873fe38644ad7557b168e43/abc12345/gps/1488369600.csv".to_string(),
            chunk_hash: None,
            data_type: "gps".to_string(),
            time_bin: Utc.timestamp_opt(1_488_369_600, 0).unwrap(),
            is_chunkable: true,
        }
    }

    #[test]
    fn test_resolves_every_reference() {
        let chunk = build_chunk(&source_chunk(Some("5873fe38644ad7557b168e45")), &context()).unwrap();

        assert_eq!(chunk.study_id, 1);
        assert_eq!(chunk.participant_id, 2);
        assert_eq!(chunk.survey_id, Some(3));
        assert_eq!(chunk.chunk_hash, "");
        assert_eq!(chunk.data_type, DataType::Gps);
        assert!(chunk.deleted);
    }

    #[test]
    fn test_unknown_survey_is_referential_error() {
        let result = build_chunk(&source_chunk(Some("5873fe38644ad7557b168e46")), &context());

        assert!(matches!(
            result,
            Err(MigrationError::Referential { kind: EntityKind::Survey, .. })
        ));
    }
}
