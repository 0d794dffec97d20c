use std::collections::HashSet;

use study_migrator_repository::DestinationStore;
use study_migrator_shared::types::Record;
use study_migrator_shared::validation::ValidationError;

use crate::errors::MigrationError;

/// Records accepted for one bulk insert.
///
/// A record is admitted only once it passes field validation and none of its
/// unique values is already taken, either in the destination or by a record
/// admitted earlier into the same batch.
#[derive(Debug)]
pub struct Batch<R> {
    records: Vec<R>,
    taken: HashSet<(&'static str, String)>,
}

impl<R: Record> Batch<R> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            taken: HashSet::new(),
        }
    }

    pub async fn admit(
        &mut self,
        record: R,
        destination: &dyn DestinationStore,
    ) -> Result<(), MigrationError> {
        let invalid = |source| MigrationError::Validation {
            kind: R::KIND,
            label: record.label(),
            source,
        };

        record.validate().map_err(invalid)?;

        let mut keys = Vec::new();
        for key in record.unique_keys() {
            let entry = (key.field(), key.value());
            if self.taken.contains(&entry) || destination.exists(key).await? {
                return Err(invalid(ValidationError::Duplicate {
                    entity: R::KIND.as_str(),
                    field: entry.0,
                    value: entry.1,
                }));
            }
            keys.push(entry);
        }

        self.taken.extend(keys);
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: Record> Default for Batch<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_migrator_repository::InMemoryDestinationStore;
    use study_migrator_shared::types::{EntityKind, NewStudy};

    fn study(name: &str, object_id: &str) -> NewStudy {
        NewStudy {
            name: name.to_string(),
            encryption_key: "k".repeat(32),
            object_id: object_id.to_string(),
            deleted: false,
        }
    }

    #[tokio::test]
    async fn test_duplicate_within_batch_is_rejected() {
        let destination = InMemoryDestinationStore::new();
        let mut batch = Batch::new();

        batch
            .admit(study("A", "5873fe38644ad7557b168e43"), &destination)
            .await
            .unwrap();
        let result = batch
            .admit(study("A", "5873fe38644ad7557b168e44"), &destination)
            .await;

        assert!(matches!(
            result,
            Err(MigrationError::Validation {
                kind: EntityKind::Study,
                source: ValidationError::Duplicate { field: "name", .. },
                ..
            })
        ));
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_existing_row_is_rejected() {
        let destination = InMemoryDestinationStore::new();
        destination
            .insert_studies(&[study("A", "5873fe38644ad7557b168e43")])
            .await
            .unwrap();
        let mut batch = Batch::new();

        let result = batch
            .admit(study("B", "5873fe38644ad7557b168e43"), &destination)
            .await;

        assert!(matches!(
            result,
            Err(MigrationError::Validation {
                source: ValidationError::Duplicate { field: "object_id", .. },
                ..
            })
        ));
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_field_is_rejected_before_uniqueness() {
        let destination = InMemoryDestinationStore::new();
        let mut batch = Batch::new();

        let result = batch
            .admit(study("", "5873fe38644ad7557b168e43"), &destination)
            .await;

        assert!(matches!(
            result,
            Err(MigrationError::Validation {
                source: ValidationError::Required { field: "name" },
                ..
            })
        ));
    }
}
