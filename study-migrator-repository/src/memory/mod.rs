//! In-memory stores.
//!
//! Both ends of the migration can be swapped for these to drive the migrator
//! without a document export or a database, e.g. in tests or dry runs.
mod destination_store;
mod source_store;

pub use destination_store::{InMemoryDestinationStore, InMemoryTables, InsertCall, Stored};
pub use source_store::InMemorySourceStore;
