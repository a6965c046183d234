use async_trait::async_trait;
use cs_core::error::StoreError;
use cs_core::types::Document;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::collection::{DocumentCollection, StoreResult};
use crate::query::{DocumentSnapshot, Query};

/// In-memory document collection.
pub struct MemoryCollection {
    name: String,
    docs: RwLock<BTreeMap<String, Document>>,
    closed: AtomicBool,
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(BTreeMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.docs.read().keys().cloned().collect()
    }

    /// Snapshot of every stored document, in key order.
    pub fn snapshot(&self) -> Vec<DocumentSnapshot> {
        self.docs
            .read()
            .iter()
            .map(|(k, v)| DocumentSnapshot::new(k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn from_documents(name: impl Into<String>, docs: BTreeMap<String, Document>) -> Self {
        Self {
            name: name.into(),
            docs: RwLock::new(docs),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn documents(&self) -> BTreeMap<String, Document> {
        self.docs.read().clone()
    }

    pub(crate) fn replace_documents(&self, docs: BTreeMap<String, Document>) {
        *self.docs.write() = docs;
    }

    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed(self.name.clone()));
        }
        Ok(())
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new("default")
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        self.check_open()?;
        let docs = self.docs.read();
        let candidates = docs
            .iter()
            .filter(|(_, fields)| query.matches(fields))
            .map(|(k, v)| DocumentSnapshot::new(k.clone(), v.clone()))
            .collect::<Vec<_>>();
        Ok(query.apply(candidates))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<DocumentSnapshot>> {
        self.check_open()?;
        Ok(self.docs.read().get(key).map(|v| DocumentSnapshot::new(key, v.clone())))
    }

    async fn set(&self, key: &str, fields: Document) -> StoreResult<()> {
        self.check_open()?;
        self.docs.write().insert(key.to_string(), fields);
        Ok(())
    }

    async fn update(&self, key: &str, partial: Document) -> StoreResult<()> {
        self.check_open()?;
        let mut docs = self.docs.write();
        let doc = docs
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound { key: key.to_string() })?;
        doc.extend(partial);
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        self.mark_closed();
        Ok(())
    }
}
