// Migration executor - orchestrates the migration flow
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use study_migrator_repository::{
    DestinationStore, DestinationStoreError, SourceStore, SourceStoreError, TableCounts,
};
use tracing::info;

use crate::config::DEFAULT_CHUNK_BATCH_SIZE;
use crate::errors::MigrationFailure;
use crate::migration::{ErrorCollector, MigrationContext};

/// Outcome of a run: destination row counts around it and how long it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub before: TableCounts,
    pub after: TableCounts,
    pub elapsed: Duration,
}

/// Migrator that moves every collection of the source store into the
/// destination store.
///
/// Stages run strictly in order, each one reading the lookup tables the
/// previous ones built. Stages can also be driven one at a time.
pub struct Migrator {
    pub(crate) source: Arc<dyn SourceStore>,
    pub(crate) destination: Arc<dyn DestinationStore>,
    pub(crate) chunk_batch_size: usize,
    pub(crate) context: MigrationContext,
    pub(crate) errors: ErrorCollector,
}

impl Migrator {
    /// Create a new migrator over the two stores
    pub fn new(source: Arc<dyn SourceStore>, destination: Arc<dyn DestinationStore>) -> Self {
        Self {
            source,
            destination,
            chunk_batch_size: DEFAULT_CHUNK_BATCH_SIZE,
            context: MigrationContext::default(),
            errors: ErrorCollector::new(),
        }
    }

    /// Sets how many chunk registry records go into one bulk insert.
    ///
    /// A size of zero is treated as one.
    pub fn with_chunk_batch_size(mut self, chunk_batch_size: usize) -> Self {
        self.chunk_batch_size = chunk_batch_size.max(1);
        self
    }

    pub fn context(&self) -> &MigrationContext {
        &self.context
    }

    pub fn errors(&self) -> &ErrorCollector {
        &self.errors
    }

    /// Execute the full migration process
    ///
    /// Every stage runs even when earlier ones recorded errors; the errors
    /// are returned together once the last stage is done.
    pub async fn run(mut self) -> Result<MigrationReport, MigrationFailure> {
        let start_time = Instant::now();

        let before = self.counts().await;
        info!("Destination before migration: {}", before);

        self.migrate_studies().await;
        self.remap_study_relationships().await;
        self.migrate_surveys().await;
        self.migrate_settings().await;
        self.migrate_admins().await;
        self.migrate_users().await;
        self.migrate_chunk_registries().await;

        let after = self.counts().await;
        let report = MigrationReport {
            before,
            after,
            elapsed: start_time.elapsed(),
        };

        info!("=== Migration Complete ===");
        info!("Total time: {:.2}s", report.elapsed.as_secs_f64());
        info!("Destination after migration: {}", after);

        match self.errors.into_result() {
            Ok(()) => Ok(report),
            Err(errors) => Err(MigrationFailure { report, errors }),
        }
    }

    async fn counts(&mut self) -> TableCounts {
        let counts = self.destination.counts().await;
        self.errors.collect(counts).unwrap_or_default()
    }

    /// Drains a source stream, recording unreadable documents.
    pub(crate) async fn read_all<T>(
        &mut self,
        documents: impl Stream<Item = Result<T, SourceStoreError>>,
    ) -> Vec<T> {
        let mut documents = std::pin::pin!(documents);
        let mut read = Vec::new();
        while let Some(document) = documents.next().await {
            if let Some(document) = self.errors.collect(document) {
                read.push(document);
            }
        }
        read
    }

    /// Records the error of a failed bulk insert.
    pub(crate) fn check_insert(&mut self, result: Result<(), DestinationStoreError>) -> bool {
        self.errors.collect(result).is_some()
    }
}
