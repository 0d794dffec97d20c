// Configuration constants and environment helpers
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

// Batch processing configuration
pub const DEFAULT_CHUNK_BATCH_SIZE: usize = 1000;

// PostgreSQL connection pool configuration
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 5;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const SOURCE_DUMP_DIR: &str = "SOURCE_DUMP_DIR";
pub const CHUNK_BATCH_SIZE: &str = "CHUNK_BATCH_SIZE";
pub const PG_MAX_CONNECTIONS: &str = "PG_MAX_CONNECTIONS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings of a migration run, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Destination PostgreSQL connection string.
    pub database_url: String,
    /// Directory holding one `<collection>.json` export per collection.
    pub source_dump_dir: PathBuf,
    /// Chunk registry records per bulk insert.
    pub chunk_batch_size: usize,
    pub pg_max_connections: u32,
}

impl MigrationConfig {
    /// Reads the configuration from environment variables.
    ///
    /// `DATABASE_URL` and `SOURCE_DUMP_DIR` are required; `CHUNK_BATCH_SIZE`
    /// and `PG_MAX_CONNECTIONS` fall back to their defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let chunk_batch_size = optional(CHUNK_BATCH_SIZE, DEFAULT_CHUNK_BATCH_SIZE)?;
        if chunk_batch_size == 0 {
            return Err(ConfigError::Invalid {
                name: CHUNK_BATCH_SIZE,
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            database_url: required(DATABASE_URL)?,
            source_dump_dir: PathBuf::from(required(SOURCE_DUMP_DIR)?),
            chunk_batch_size,
            pg_max_connections: optional(PG_MAX_CONNECTIONS, DEFAULT_PG_MAX_CONNECTIONS)?,
        })
    }
}

/// Get a required, non-empty variable from the environment
fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Parse an optional variable, falling back to `default` when unset
fn optional<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value: value.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}
