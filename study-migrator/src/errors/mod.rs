//! Error types for the study migrator.
//! Per-record migration errors, the aggregate failure of a run, and the
//! top-level error of the binary.
use study_migrator_repository::{DestinationStoreError, SourceStoreError};
use study_migrator_shared::types::EntityKind;
use study_migrator_shared::validation::ValidationError;

use crate::config::ConfigError;
use crate::migration::MigrationReport;

/// A failure to migrate one record, or one stage-level call.
///
/// These are collected rather than propagated: a run keeps going past them
/// and reports all of them at the end.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("{kind} {id} is referenced by {referrer} but does not exist in the database")]
    Referential {
        kind: EntityKind,
        id: String,
        referrer: String,
    },

    #[error("{kind} {id} is present in the database but is not connected to any Study")]
    MissingRequiredForeignKey { kind: EntityKind, id: String },

    #[error("{kind} {id} was not created")]
    ObjectCreation { kind: EntityKind, id: String },

    #[error("{kind} {label} is invalid: {source}")]
    Validation {
        kind: EntityKind,
        label: String,
        #[source]
        source: ValidationError,
    },

    #[error("Failed to encode {field} of {kind} {id}: {source}")]
    Serialization {
        kind: EntityKind,
        id: String,
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Source error: {0}")]
    Source(#[from] SourceStoreError),

    #[error("Destination error: {0}")]
    Destination(#[from] DestinationStoreError),
}

/// A run that finished with at least one collected error.
#[derive(Debug, thiserror::Error)]
#[error("Migration finished with {} error(s)", .errors.len())]
pub struct MigrationFailure {
    /// Counts and timing of the run, which still committed whatever it could.
    pub report: MigrationReport,
    pub errors: Vec<MigrationError>,
}

/// Error types for the migrator binary.
#[derive(Debug, thiserror::Error)]
pub enum MigratorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Destination error: {0}")]
    Destination(#[from] DestinationStoreError),
    #[error(transparent)]
    Migration(#[from] MigrationFailure),
}
