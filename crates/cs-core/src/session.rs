use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;

use crate::error::{Result, SessionError};
use crate::key::DocumentKey;
use crate::types::{fields, Document};

/// A user's pointer to their current (or a historical) conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub conversation_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Fresh session with no conversation yet, stamped now.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_id: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Refresh `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the session is older than `timeout` as of `now`.
    pub fn is_stale(&self, timeout: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.updated_at) > timeout
    }

    pub fn document_key(&self) -> DocumentKey {
        DocumentKey::new(&self.user_id, self.conversation_id.as_deref())
    }

    /// Stored representation: `{user_id, conversation_id, updated_at}`.
    pub fn serialize(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::USER_ID.into(), Value::String(self.user_id.clone()));
        doc.insert(
            fields::CONVERSATION_ID.into(),
            self.conversation_id.clone().map(Value::String).unwrap_or(Value::Null),
        );
        doc.insert(fields::UPDATED_AT.into(), Value::String(format_timestamp(&self.updated_at)));
        doc
    }

    /// Rebuild a session from its stored fields. Unknown fields are ignored.
    pub fn deserialize(doc: &Document) -> Result<Self> {
        let user_id = match doc.get(fields::USER_ID) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::String(_)) => return Err(SessionError::malformed("user_id is empty")),
            Some(other) => {
                return Err(SessionError::malformed(format!("user_id is not a string: {other}")))
            }
            None => return Err(SessionError::malformed("missing user_id")),
        };

        let conversation_id = match doc.get(fields::CONVERSATION_ID) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(SessionError::malformed(format!(
                    "conversation_id is not a string: {other}"
                )))
            }
        };

        let updated_at = match doc.get(fields::UPDATED_AT) {
            Some(Value::String(s)) => parse_timestamp(s)
                .ok_or_else(|| SessionError::malformed(format!("invalid updated_at: {s:?}")))?,
            Some(other) => {
                return Err(SessionError::malformed(format!("updated_at is not a string: {other}")))
            }
            None => return Err(SessionError::malformed("missing updated_at")),
        };

        Ok(Self { user_id, conversation_id, updated_at })
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session(user={}, conversation={}, updated_at={})",
            self.user_id,
            self.conversation_id.as_deref().unwrap_or("-"),
            format_timestamp(&self.updated_at)
        )
    }
}

/// Fixed-width RFC 3339 UTC form; sorts lexicographically in time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse any RFC 3339 timestamp and normalize it to UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc))
}
