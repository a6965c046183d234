use async_trait::async_trait;
use cs_core::error::StoreError;
use cs_core::types::Document;

use crate::query::{DocumentSnapshot, Query};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Minimal remote document collection consumed by the session store.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Run a filtered, ordered, limited query.
    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Fetch one document by key.
    async fn get(&self, key: &str) -> StoreResult<Option<DocumentSnapshot>>;

    /// Full-overwrite upsert.
    async fn set(&self, key: &str, fields: Document) -> StoreResult<()>;

    /// Merge `partial` into an existing document. Fails with `NotFound` if absent.
    async fn update(&self, key: &str, partial: Document) -> StoreResult<()>;

    /// Release the handle. Later calls fail with `StoreError::Closed`.
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
