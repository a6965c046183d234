use serde_json::{Map, Value};

/// Loosely-typed field map as held by the document store.
pub type Document = Map<String, Value>;

/// Stored field names.
pub mod fields {
    pub const USER_ID: &str = "user_id";
    pub const CONVERSATION_ID: &str = "conversation_id";
    pub const UPDATED_AT: &str = "updated_at";
    pub const IS_EXPIRED: &str = "is_expired";
}
