//! A source store backed by a directory of collection exports.
//!
//! Each collection lives in `<dir>/<collection>.json`, one extended-JSON
//! document per line, as written by `mongoexport`.
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use study_migrator_shared::types::{
    ObjectId, SourceAdmin, SourceChunk, SourceDeviceSettings, SourceStudy, SourceSurvey,
    SourceUser,
};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::errors::SourceStoreError;
use crate::interfaces::{DocumentStream, SourceStore};
use crate::types::Collection;

/// Reads collections from JSON-lines export files.
///
/// Collections are streamed line by line, so even the chunk registry export
/// never has to fit in memory. Surveys and device settings, which are looked
/// up by id, are indexed on first lookup.
pub struct DumpSourceStore {
    dir: PathBuf,
    surveys: OnceCell<HashMap<ObjectId, SourceSurvey>>,
    device_settings: OnceCell<HashMap<ObjectId, SourceDeviceSettings>>,
}

impl DumpSourceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            surveys: OnceCell::new(),
            device_settings: OnceCell::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.as_str()))
    }

    /// Streams the documents of one collection.
    ///
    /// A missing export file is read as an empty collection.
    fn read_collection<T>(&self, collection: Collection) -> DocumentStream<'_, T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let path = self.path(collection);

        Box::pin(stream! {
            let file = match File::open(&path).await {
                Ok(file) => file,
                Err(source) if source.kind() == ErrorKind::NotFound => {
                    warn!(%collection, path = %path.display(), "Export file not found, treating collection as empty");
                    return;
                }
                Err(source) => {
                    yield Err(SourceStoreError::Io { path, source });
                    return;
                }
            };

            let mut lines = BufReader::new(file).lines();
            let mut line_number = 0;
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        line_number += 1;
                        if line.trim().is_empty() {
                            continue;
                        }
                        yield serde_json::from_str::<T>(&line).map_err(|source| {
                            SourceStoreError::Decode {
                                collection,
                                line: line_number,
                                source,
                            }
                        });
                    }
                    Ok(None) => break,
                    Err(source) => {
                        yield Err(SourceStoreError::Io { path: path.clone(), source });
                        break;
                    }
                }
            }
        })
    }

    /// Builds an id index over a whole collection.
    ///
    /// Documents that fail to decode are left out of the index, so a lookup
    /// for them reports the document as missing.
    async fn index<T, F>(
        &self,
        collection: Collection,
        id_of: F,
    ) -> Result<HashMap<ObjectId, T>, SourceStoreError>
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(&T) -> ObjectId,
    {
        let mut index = HashMap::new();
        let mut documents = self.read_collection::<T>(collection);
        while let Some(document) = documents.next().await {
            match document {
                Ok(document) => {
                    index.insert(id_of(&document), document);
                }
                Err(SourceStoreError::Decode { line, source, .. }) => {
                    warn!(%collection, line, error = %source, "Skipping undecodable document");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(%collection, documents = index.len(), "Indexed collection");
        Ok(index)
    }
}

#[async_trait]
impl SourceStore for DumpSourceStore {
    fn studies(&self) -> DocumentStream<'_, SourceStudy> {
        self.read_collection(Collection::Studies)
    }

    fn surveys(&self) -> DocumentStream<'_, SourceSurvey> {
        self.read_collection(Collection::Surveys)
    }

    fn device_settings(&self) -> DocumentStream<'_, SourceDeviceSettings> {
        self.read_collection(Collection::DeviceSettings)
    }

    fn admins(&self) -> DocumentStream<'_, SourceAdmin> {
        self.read_collection(Collection::Admins)
    }

    fn users(&self) -> DocumentStream<'_, SourceUser> {
        self.read_collection(Collection::Users)
    }

    fn chunk_registries(&self) -> DocumentStream<'_, SourceChunk> {
        self.read_collection(Collection::ChunkRegistries)
    }

    async fn count(&self, collection: Collection) -> Result<u64, SourceStoreError> {
        let path = self.path(collection);
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(SourceStoreError::Io { path, source }),
        };

        let mut lines = BufReader::new(file).lines();
        let mut count = 0;
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|source| SourceStoreError::Io { path: path.clone(), source })?
        {
            if !line.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_survey(&self, id: &ObjectId) -> Result<Option<SourceSurvey>, SourceStoreError> {
        let index = self
            .surveys
            .get_or_try_init(|| self.index(Collection::Surveys, |survey: &SourceSurvey| survey.id.clone()))
            .await?;
        Ok(index.get(id).cloned())
    }

    async fn find_device_settings(
        &self,
        id: &ObjectId,
    ) -> Result<Option<SourceDeviceSettings>, SourceStoreError> {
        let index = self
            .device_settings
            .get_or_try_init(|| {
                self.index(Collection::DeviceSettings, |settings: &SourceDeviceSettings| {
                    settings.id.clone()
                })
            })
            .await?;
        Ok(index.get(id).cloned())
    }
}
