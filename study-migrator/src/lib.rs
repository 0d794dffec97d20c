//! # Study Migrator
//! One-time migration of a research-study platform from its legacy document
//! store to a relational schema. Studies, surveys, device settings, admins,
//! users and chunk registries are copied in seven ordered stages; records
//! that fail are collected and reported together at the end of the run.
pub mod config;
pub mod errors;
pub mod migration;

pub use config::{ConfigError, MigrationConfig};
pub use errors::{MigrationError, MigrationFailure, MigratorError};
pub use migration::{ErrorCollector, MigrationContext, MigrationReport, Migrator};
