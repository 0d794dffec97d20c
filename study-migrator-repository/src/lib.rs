//! # Study Migrator Repository
//! This crate provides the traits and implementations for both ends of the
//! migration: the legacy document store records are read from, and the
//! relational store they are written to. It includes definitions for errors,
//! interfaces, a PostgreSQL destination, a JSON-dump source, and in-memory
//! implementations of both used by tests and local dry runs.
pub mod dump;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod types;

pub use dump::DumpSourceStore;
pub use errors::{DestinationStoreError, SourceStoreError};
pub use interfaces::{DestinationStore, DocumentStream, SourceStore};
pub use memory::{InMemoryDestinationStore, InMemorySourceStore};
pub use postgres::PostgresDestinationStore;
pub use types::{Collection, TableCounts};
