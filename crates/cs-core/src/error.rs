use thiserror::Error;

/// Failure reported by a document-store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {key}")]
    NotFound { key: String },
    #[error("Collection is closed: {0}")]
    Closed(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse error category, for callers that map failures to external responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    MalformedRecord,
    StoreUnavailable,
    Config,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid argument to {operation}: {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },
    #[error(
        "Malformed session record {} during {operation} (user_id={}): {reason}",
        .key.as_deref().unwrap_or("<unkeyed>"),
        .user_id.as_deref().unwrap_or("-")
    )]
    MalformedRecord {
        operation: &'static str,
        user_id: Option<String>,
        key: Option<String>,
        reason: String,
    },
    #[error("Session store unavailable during {operation} (user_id={user_id}): {source}")]
    StoreUnavailable {
        operation: &'static str,
        user_id: String,
        #[source]
        source: StoreError,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    pub fn invalid_argument(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument { operation, message: message.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            operation: "deserialize",
            user_id: None,
            key: None,
            reason: reason.into(),
        }
    }

    pub fn unavailable(operation: &'static str, user_id: impl Into<String>, source: StoreError) -> Self {
        Self::StoreUnavailable { operation, user_id: user_id.into(), source }
    }

    /// Attach the failing operation, user, and document key to a
    /// `MalformedRecord`; other variants pass through.
    pub fn with_context(self, operation: &'static str, user_id: impl Into<String>, key: impl Into<String>) -> Self {
        match self {
            Self::MalformedRecord { reason, .. } => Self::MalformedRecord {
                operation,
                user_id: Some(user_id.into()),
                key: Some(key.into()),
                reason,
            },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Only transport failures are worth retrying; the store itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { source, .. } if !matches!(source, StoreError::Closed(_)))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
