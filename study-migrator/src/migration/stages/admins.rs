use std::collections::HashSet;
use std::sync::Arc;

use study_migrator_shared::types::{EntityKind, NewResearcher, StudyResearcher};
use tracing::info;

use crate::errors::MigrationError;
use crate::migration::{Batch, Migrator};

impl Migrator {
    /// Stage 5: copies every admin as a researcher, then links researchers to
    /// the studies that listed them.
    pub async fn migrate_admins(&mut self) {
        info!("=== Migrating admins ===");
        let source = Arc::clone(&self.source);
        let admins = self.read_all(source.admins()).await;

        let mut batch = Batch::new();
        for admin in &admins {
            let admit = batch
                .admit(NewResearcher::from(admin), self.destination.as_ref())
                .await;
            self.errors.collect(admit);
        }

        let inserted = self.destination.insert_researchers(batch.records()).await;
        if self.check_insert(inserted) {
            info!("✓ Migrated {} researchers", batch.len());
        }

        let researcher_ids = match self.destination.researcher_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                self.errors.record(e);
                return;
            }
        };

        let pending = std::mem::take(&mut self.context.pending_study_researchers);
        let mut relations: Vec<StudyResearcher> = Vec::with_capacity(pending.len());
        let mut linked: HashSet<StudyResearcher> = HashSet::new();
        for pair in pending {
            let Some(&researcher_id) = researcher_ids.get(&pair.username) else {
                let study = match self.destination.study_name(pair.study_id).await {
                    Ok(Some(name)) => name,
                    Ok(None) => pair.study_id.to_string(),
                    Err(e) => {
                        self.errors.record(e);
                        pair.study_id.to_string()
                    }
                };
                self.errors.record(MigrationError::Referential {
                    kind: EntityKind::Researcher,
                    id: pair.username,
                    referrer: format!("Study {}", study),
                });
                continue;
            };

            let relation = StudyResearcher {
                study_id: pair.study_id,
                researcher_id,
            };
            // a study listing the same admin twice still gets one link
            if linked.insert(relation) {
                relations.push(relation);
            }
        }

        let inserted = self.destination.insert_study_researchers(&relations).await;
        if self.check_insert(inserted) {
            info!("✓ Linked {} researchers to studies", relations.len());
        }
    }
}
