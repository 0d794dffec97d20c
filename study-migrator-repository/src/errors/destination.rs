//! Error types for writing to the relational store.
use study_migrator_shared::types::EntityKind;
use thiserror::Error;

/// Represents errors that can occur within the destination store.
///
/// Bulk inserts are atomic: when one of these is returned, none of the rows
/// of the failing call were written.
#[derive(Debug, Error)]
pub enum DestinationStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Schema migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Unique constraint violated: {entity} with {field} `{value}` already exists")]
    UniqueViolation {
        entity: EntityKind,
        field: &'static str,
        value: String,
    },

    #[error("Foreign key violated: {entity} references missing {target} {pk}")]
    ForeignKeyViolation {
        entity: EntityKind,
        target: EntityKind,
        pk: i64,
    },

    #[error("Insert of {0} rows rejected")]
    Rejected(EntityKind),
}
