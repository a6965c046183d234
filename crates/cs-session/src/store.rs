//! Session lifecycle policy over a remote document collection.
//!
//! Each operation is one or two round trips; nothing is cached, locked, or
//! retried here. Concurrent writers to the same key are last-writer-wins.

use chrono::Utc;
use cs_core::config::SessionStoreConfig;
use cs_core::error::{Result, SessionError};
use cs_core::session::Session;
use cs_core::types::{fields, Document};
use cs_docstore::{Direction, DocumentCollection, DocumentSnapshot, Query};
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionStore {
    collection: Arc<dyn DocumentCollection>,
    config: SessionStoreConfig,
}

impl SessionStore {
    pub fn new(collection: Arc<dyn DocumentCollection>, config: SessionStoreConfig) -> Self {
        Self { collection, config }
    }

    /// Open the backend described by `config`. Call once at startup.
    pub async fn open(config: SessionStoreConfig) -> Result<Self> {
        config.validate()?;
        let collection = cs_docstore::open_collection(&config)
            .await
            .map_err(|e| SessionError::unavailable("open", "", e))?;
        Ok(Self::new(collection, config))
    }

    /// Release the backend handle. Call once at shutdown.
    pub async fn close(&self) -> Result<()> {
        tracing::info!(collection = %self.collection.name(), "closing session store");
        self.collection
            .close()
            .await
            .map_err(|e| SessionError::unavailable("close", "", e))
    }

    pub fn config(&self) -> &SessionStoreConfig {
        &self.config
    }

    pub fn collection(&self) -> &Arc<dyn DocumentCollection> {
        &self.collection
    }

    /// Current session for `user_id`.
    ///
    /// Returns a fresh, unsaved session when the user has no document, when the
    /// most recent one is older than the timeout, or when it was expired.
    pub async fn get_session(&self, user_id: &str) -> Result<Session> {
        const OP: &str = "get_session";
        require_user_id(OP, user_id)?;

        let now = Utc::now();
        let Some(doc) = self.latest_document(OP, user_id).await? else {
            tracing::debug!(user_id, "no stored session, starting fresh");
            return Ok(Session::new(user_id));
        };

        if self.config.honor_expired_flag && is_expired(&doc) {
            tracing::debug!(user_id, key = %doc.key, "latest session expired, starting fresh");
            return Ok(Session::new(user_id));
        }

        let session = decode(OP, user_id, &doc)?;
        if let Some(timeout) = self.config.timeout() {
            if session.is_stale(timeout, now) {
                tracing::debug!(user_id, key = %doc.key, updated_at = %session.updated_at, "session timed out");
                return Ok(Session::new(user_id));
            }
        }
        Ok(session)
    }

    /// Stamp `session` with the current time and upsert it at its document key.
    pub async fn set_session(&self, session: &mut Session) -> Result<()> {
        const OP: &str = "set_session";
        require_user_id(OP, &session.user_id)?;

        session.touch();
        let key = session.document_key();
        tracing::debug!(user_id = %session.user_id, key = %key, "writing session");
        self.collection
            .set(key.as_str(), session.serialize())
            .await
            .map_err(|e| unavailable(OP, &session.user_id, e))
    }

    /// Flag the user's most recent document as expired. No-op if there is none.
    pub async fn expire_session(&self, user_id: &str) -> Result<()> {
        const OP: &str = "expire_session";
        require_user_id(OP, user_id)?;

        let Some(doc) = self.latest_document(OP, user_id).await? else {
            tracing::debug!(user_id, "nothing to expire");
            return Ok(());
        };

        let mut partial = Document::new();
        partial.insert(fields::IS_EXPIRED.into(), Value::Bool(true));
        tracing::debug!(user_id, key = %doc.key, "expiring session");
        self.collection
            .update(&doc.key, partial)
            .await
            .map_err(|e| unavailable(OP, user_id, e))
    }

    /// Up to `count` of the user's sessions, oldest first.
    pub async fn get_user_conversations(&self, user_id: &str, count: usize) -> Result<Vec<Session>> {
        const OP: &str = "get_user_conversations";
        require_user_id(OP, user_id)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let docs = self
            .collection
            .query(&recent_query(user_id, count))
            .await
            .map_err(|e| unavailable(OP, user_id, e))?;
        tracing::debug!(user_id, found = docs.len(), "listed conversations");
        docs.iter().rev().map(|doc| decode(OP, user_id, doc)).collect()
    }

    /// [`get_user_conversations`](Self::get_user_conversations) with the configured `history_limit`.
    pub async fn get_recent_conversations(&self, user_id: &str) -> Result<Vec<Session>> {
        self.get_user_conversations(user_id, self.config.history_limit).await
    }

    async fn latest_document(&self, op: &'static str, user_id: &str) -> Result<Option<DocumentSnapshot>> {
        let docs = self
            .collection
            .query(&recent_query(user_id, 1))
            .await
            .map_err(|e| unavailable(op, user_id, e))?;
        Ok(docs.into_iter().next())
    }
}

fn recent_query(user_id: &str, limit: usize) -> Query {
    Query::where_eq(fields::USER_ID, user_id)
        .order_by(fields::UPDATED_AT, Direction::Descending)
        .limit(limit)
}

fn require_user_id(op: &'static str, user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(SessionError::invalid_argument(op, "user_id is required"));
    }
    Ok(())
}

fn is_expired(doc: &DocumentSnapshot) -> bool {
    matches!(doc.get(fields::IS_EXPIRED), Some(Value::Bool(true)))
}

fn decode(op: &'static str, user_id: &str, doc: &DocumentSnapshot) -> Result<Session> {
    Session::deserialize(&doc.fields).map_err(|e| {
        tracing::warn!(operation = op, user_id, key = %doc.key, error = %e, "malformed session document");
        e.with_context(op, user_id, doc.key.clone())
    })
}

fn unavailable(op: &'static str, user_id: &str, source: cs_core::error::StoreError) -> SessionError {
    tracing::warn!(operation = op, user_id, error = %source, "session store call failed");
    SessionError::unavailable(op, user_id, source)
}
