//! This module defines the `SourceStore` trait, the read-only view of the
//! legacy document store that records are migrated from.
use futures::stream::BoxStream;
use study_migrator_shared::types::{
    ObjectId, SourceAdmin, SourceChunk, SourceDeviceSettings, SourceStudy, SourceSurvey,
    SourceUser,
};

use crate::errors::SourceStoreError;
use crate::types::Collection;

/// A stream over every document of one collection.
///
/// A document that cannot be read is yielded as an error in its place; the
/// stream keeps going with the next one.
pub type DocumentStream<'a, T> = BoxStream<'a, Result<T, SourceStoreError>>;

/// A trait that defines the interface for reading the legacy document store.
///
/// Implementors expose a full iteration per collection, a document count per
/// collection, and point lookups for the two entity kinds that studies
/// reference by identifier.
#[async_trait::async_trait]
pub trait SourceStore: Send + Sync {
    /// Iterates every study document.
    fn studies(&self) -> DocumentStream<'_, SourceStudy>;

    /// Iterates every survey document.
    fn surveys(&self) -> DocumentStream<'_, SourceSurvey>;

    /// Iterates every device settings document.
    fn device_settings(&self) -> DocumentStream<'_, SourceDeviceSettings>;

    /// Iterates every admin document.
    fn admins(&self) -> DocumentStream<'_, SourceAdmin>;

    /// Iterates every user document.
    fn users(&self) -> DocumentStream<'_, SourceUser>;

    /// Iterates every chunk registry document.
    ///
    /// This is by far the largest collection, so implementations must not
    /// load it into memory all at once.
    fn chunk_registries(&self) -> DocumentStream<'_, SourceChunk>;

    /// Counts the documents of a collection.
    async fn count(&self, collection: Collection) -> Result<u64, SourceStoreError>;

    /// Looks up a survey by identifier.
    async fn find_survey(&self, id: &ObjectId) -> Result<Option<SourceSurvey>, SourceStoreError>;

    /// Looks up a device settings document by identifier.
    async fn find_device_settings(
        &self,
        id: &ObjectId,
    ) -> Result<Option<SourceDeviceSettings>, SourceStoreError>;
}
