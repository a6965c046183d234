//! Document-store interface for the session store, with in-memory and
//! JSON-file backends.

pub mod collection;
pub mod file;
pub mod memory;
pub mod query;

pub use collection::{DocumentCollection, StoreResult};
pub use file::FileCollection;
pub use memory::MemoryCollection;
pub use query::{Direction, DocumentSnapshot, Query};

use cs_core::config::{BackendConfig, SessionStoreConfig};
use std::sync::Arc;

/// Build the backend named by the configuration.
pub async fn open_collection(config: &SessionStoreConfig) -> StoreResult<Arc<dyn DocumentCollection>> {
    let collection: Arc<dyn DocumentCollection> = match &config.backend {
        BackendConfig::Memory => Arc::new(MemoryCollection::new(config.collection.clone())),
        BackendConfig::File { path } => Arc::new(FileCollection::open(path, &config.collection).await?),
    };
    tracing::info!(collection = %config.collection, backend = ?config.backend, "document collection opened");
    Ok(collection)
}

#[cfg(test)]
mod tests;
