//! Error types for reading the legacy document store.
use std::path::PathBuf;
use thiserror::Error;

use crate::types::Collection;

/// Represents errors that can occur while reading source documents.
///
/// Decode errors carry the collection and line so the offending document can
/// be found in the export.
#[derive(Debug, Error)]
pub enum SourceStoreError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {collection} document at line {line}: {source}")]
    Decode {
        collection: Collection,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
