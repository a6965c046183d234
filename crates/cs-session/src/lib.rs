//! Conversation session store: tracks each user's most recent conversation,
//! times out stale sessions, and lists conversation history.

pub mod store;

pub use cs_core::{ErrorKind, Result, Session, SessionError, SessionStoreConfig};
pub use store::SessionStore;
