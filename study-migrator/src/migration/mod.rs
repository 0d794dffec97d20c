//! Migration flow: lookup tables, error collection, batching and the staged
//! executor.
mod batch;
mod collector;
mod context;
mod executor;
mod stages;

pub use batch::Batch;
pub use collector::ErrorCollector;
pub use context::{MigrationContext, PendingStudyResearcher, StudyReferents};
pub use executor::{MigrationReport, Migrator};
