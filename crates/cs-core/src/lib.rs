//! Session entity, document key scheme, errors, and configuration for the
//! conversation session store.

pub mod config;
pub mod error;
pub mod key;
pub mod session;
pub mod types;

pub use config::{BackendConfig, SessionStoreConfig};
pub use error::{ErrorKind, Result, SessionError, StoreError};
pub use key::DocumentKey;
pub use session::Session;
pub use types::Document;
