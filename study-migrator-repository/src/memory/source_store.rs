use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use study_migrator_shared::types::{
    ObjectId, SourceAdmin, SourceChunk, SourceDeviceSettings, SourceStudy, SourceSurvey,
    SourceUser,
};

use crate::errors::SourceStoreError;
use crate::interfaces::{DocumentStream, SourceStore};
use crate::types::Collection;

/// A source store holding raw documents in memory.
///
/// Documents are kept as JSON values and decoded on read, the same way the
/// export-backed store decodes lines, so a malformed document surfaces as a
/// decode error at its position in the stream.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceStore {
    collections: HashMap<Collection, Vec<Value>>,
}

impl InMemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw document to a collection.
    pub fn with_document(mut self, collection: Collection, document: Value) -> Self {
        self.collections.entry(collection).or_default().push(document);
        self
    }

    /// Appends raw documents to a collection.
    pub fn with_documents(
        mut self,
        collection: Collection,
        documents: impl IntoIterator<Item = Value>,
    ) -> Self {
        self.collections
            .entry(collection)
            .or_default()
            .extend(documents);
        self
    }

    fn documents(&self, collection: Collection) -> &[Value] {
        self.collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn decode_all<T>(&self, collection: Collection) -> DocumentStream<'_, T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let documents = self.documents(collection);
        futures::stream::iter(documents.iter().enumerate().map(move |(index, document)| {
            T::deserialize(document).map_err(|source| SourceStoreError::Decode {
                collection,
                line: index + 1,
                source,
            })
        }))
        .boxed()
    }

    fn find<T>(&self, collection: Collection, matches: impl Fn(&T) -> bool) -> Option<T>
    where
        T: DeserializeOwned,
    {
        self.documents(collection)
            .iter()
            .filter_map(|document| T::deserialize(document).ok())
            .find(|document| matches(document))
    }
}

#[async_trait]
impl SourceStore for InMemorySourceStore {
    fn studies(&self) -> DocumentStream<'_, SourceStudy> {
        self.decode_all(Collection::Studies)
    }

    fn surveys(&self) -> DocumentStream<'_, SourceSurvey> {
        self.decode_all(Collection::Surveys)
    }

    fn device_settings(&self) -> DocumentStream<'_, SourceDeviceSettings> {
        self.decode_all(Collection::DeviceSettings)
    }

    fn admins(&self) -> DocumentStream<'_, SourceAdmin> {
        self.decode_all(Collection::Admins)
    }

    fn users(&self) -> DocumentStream<'_, SourceUser> {
        self.decode_all(Collection::Users)
    }

    fn chunk_registries(&self) -> DocumentStream<'_, SourceChunk> {
        self.decode_all(Collection::ChunkRegistries)
    }

    async fn count(&self, collection: Collection) -> Result<u64, SourceStoreError> {
        Ok(self.documents(collection).len() as u64)
    }

    async fn find_survey(&self, id: &ObjectId) -> Result<Option<SourceSurvey>, SourceStoreError> {
        Ok(self.find(Collection::Surveys, |survey: &SourceSurvey| &survey.id == id))
    }

    async fn find_device_settings(
        &self,
        id: &ObjectId,
    ) -> Result<Option<SourceDeviceSettings>, SourceStoreError> {
        Ok(self.find(Collection::DeviceSettings, |settings: &SourceDeviceSettings| {
            &settings.id == id
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_malformed_document_is_yielded_in_place() {
        let store = InMemorySourceStore::new()
            .with_document(Collection::Admins, json!({"_id": "alice", "password": "p", "salt": "s"}))
            .with_document(Collection::Admins, json!({"_id": "bob"}))
            .with_document(Collection::Admins, json!({"_id": "carol", "password": "p", "salt": "s"}));

        let admins: Vec<_> = store.admins().collect().await;

        assert_eq!(admins.len(), 3);
        assert_eq!(admins[0].as_ref().unwrap().username, "alice");
        assert!(matches!(
            admins[1],
            Err(SourceStoreError::Decode { collection: Collection::Admins, line: 2, .. })
        ));
        assert_eq!(admins[2].as_ref().unwrap().username, "carol");
        assert_eq!(store.count(Collection::Admins).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_find_survey_by_id() {
        let store = InMemorySourceStore::new().with_document(
            Collection::Surveys,
            json!({
                "_id": {"$oid": "5873fe38644ad7557b168e45"},
                "content": [],
                "survey_type": "tracking_survey",
                "settings": {},
                "timings": []
            }),
        );

        let found = store
            .find_survey(&ObjectId::from("5873fe38644ad7557b168e45"))
            .await
            .unwrap();
        assert_eq!(found.map(|s| s.survey_type), Some("tracking_survey".to_string()));

        let missing = store
            .find_survey(&ObjectId::from("5873fe38644ad7557b168e46"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
