//! JSON-file persisted document collection.
//!
//! The whole collection lives in `{dir}/{name}.json`. It is loaded once on
//! `open` and rewritten atomically (temp file + rename) after each mutation.
//! A mutation becomes visible to reads only once it is on disk.

use async_trait::async_trait;
use cs_core::error::StoreError;
use cs_core::types::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::collection::{DocumentCollection, StoreResult};
use crate::memory::MemoryCollection;
use crate::query::{DocumentSnapshot, Query};

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    collection: String,
    #[serde(default)]
    documents: BTreeMap<String, Document>,
}

pub struct FileCollection {
    path: PathBuf,
    inner: MemoryCollection,
    write_lock: Mutex<()>,
}

impl FileCollection {
    /// Open (or create) the collection `name` under `dir`.
    pub async fn open(dir: impl AsRef<Path>, name: &str) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{name}.json"));

        let documents = match fs::read(&path).await {
            Ok(bytes) => {
                let file: CollectionFile = serde_json::from_slice(&bytes)?;
                if file.collection != name {
                    return Err(StoreError::Backend(format!(
                        "{} holds collection {:?}, expected {name:?}",
                        path.display(),
                        file.collection
                    )));
                }
                file.documents
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), documents = documents.len(), "opened file collection");
        Ok(Self {
            path,
            inner: MemoryCollection::from_documents(name, documents),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Apply a mutation to a copy of the documents, write the copy to disk,
    /// and only then make it visible. A failed write leaves memory untouched.
    async fn commit<F>(&self, mutate: F) -> StoreResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, Document>) -> StoreResult<()> + Send,
    {
        let _guard = self.write_lock.lock().await;
        self.inner.check_open()?;
        let mut documents = self.inner.documents();
        mutate(&mut documents)?;
        self.write_file(&documents).await?;
        self.inner.replace_documents(documents);
        Ok(())
    }

    async fn write_file(&self, documents: &BTreeMap<String, Document>) -> StoreResult<()> {
        let file = CollectionFile {
            collection: self.inner.name().to_string(),
            documents: documents.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;

        let tmp_path = self.path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_atomic(&tmp_path, &self.path, &bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist collection");
            return Err(e.into());
        }
        Ok(())
    }
}

async fn write_atomic(tmp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = fs::File::create(tmp_path).await?;
    f.write_all(bytes).await?;
    f.flush().await?;
    f.sync_all().await?;
    fs::rename(tmp_path, path).await
}

#[async_trait]
impl DocumentCollection for FileCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        self.inner.query(query).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<DocumentSnapshot>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, fields: Document) -> StoreResult<()> {
        self.commit(|docs| {
            docs.insert(key.to_string(), fields);
            Ok(())
        })
        .await
    }

    async fn update(&self, key: &str, partial: Document) -> StoreResult<()> {
        self.commit(|docs| {
            let doc = docs
                .get_mut(key)
                .ok_or_else(|| StoreError::NotFound { key: key.to_string() })?;
            doc.extend(partial);
            Ok(())
        })
        .await
    }

    async fn close(&self) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.inner.check_open().is_ok() {
            self.write_file(&self.inner.documents()).await?;
        }
        self.inner.mark_closed();
        Ok(())
    }
}
