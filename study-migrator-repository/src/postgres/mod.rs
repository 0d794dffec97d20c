//! PostgreSQL backend for the destination store.
mod destination_store;

pub use destination_store::PostgresDestinationStore;
