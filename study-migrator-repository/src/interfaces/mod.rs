//! This module defines and re-exports the interfaces of both migration stores.
//! It serves as a central point for accessing the traits the migrator is written against.
mod destination_store;
mod source_store;

pub use destination_store::DestinationStore;
pub use source_store::{DocumentStream, SourceStore};
