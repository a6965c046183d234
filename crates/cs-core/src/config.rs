use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SessionError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStoreConfig {
    /// Name of the remote collection holding session documents.
    pub collection: String,
    /// Freshness window in seconds. `<= 0` disables expiry checking.
    pub timeout_secs: f64,
    /// Default page size for conversation history listings.
    pub history_limit: usize,
    /// Treat a most-recent document flagged `is_expired` as no session.
    pub honor_expired_flag: bool,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Memory,
    File { path: PathBuf },
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            collection: "conversation_sessions".into(),
            timeout_secs: 3600.0,
            history_limit: 20,
            honor_expired_flag: true,
            backend: BackendConfig::Memory,
        }
    }
}

impl SessionStoreConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| SessionError::Config(format!("parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("read {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loading session store config");
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(SessionError::Config("collection name is empty".into()));
        }
        if self.timeout_secs.is_nan() {
            return Err(SessionError::Config("timeout_secs is NaN".into()));
        }
        Ok(())
    }

    /// Effective timeout, or `None` when expiry checking is disabled.
    pub fn timeout(&self) -> Option<Duration> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return None;
        }
        Some(Duration::microseconds((self.timeout_secs * 1_000_000.0) as i64))
    }

    pub fn with_timeout_secs(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }
}
