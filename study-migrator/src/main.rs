use std::sync::Arc;

use dotenv::dotenv;
use study_migrator::{MigrationConfig, Migrator, MigratorError};
use study_migrator_repository::{DestinationStore, DumpSourceStore, PostgresDestinationStore};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Main entry point for the study migrator.
///
/// Loads the configuration, prepares the destination schema, and copies the
/// exported collections into it. Row counts of the destination tables are
/// printed before and after the run.
///
/// # Returns
///
/// A `Result` indicating success or a `MigratorError` if the run could not
/// start or any record failed to migrate.
#[tokio::main]
async fn main() -> Result<(), MigratorError> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = MigrationConfig::from_env()?;
    info!("Starting migration from {}", config.source_dump_dir.display());

    // Connect to PostgreSQL
    info!("Connecting to PostgreSQL...");
    let destination =
        PostgresDestinationStore::connect(&config.database_url, config.pg_max_connections).await?;
    destination.migrate().await?;
    info!("✓ Connected to PostgreSQL");

    println!("{}", destination.counts().await?);

    let source = DumpSourceStore::new(&config.source_dump_dir);
    let migrator = Migrator::new(Arc::new(source), Arc::new(destination))
        .with_chunk_batch_size(config.chunk_batch_size);

    match migrator.run().await {
        Ok(report) => {
            println!("{}", report.after);
            Ok(())
        }
        Err(failure) => {
            println!("{}", failure.report.after);
            error!("{}", failure);
            Err(failure.into())
        }
    }
}
