//! Deterministic document keys for `(user_id, conversation_id)` pairs.
//!
//! Keys look like `{user_id}_{conversation_id}`. Each component is escaped
//! (`%` → `%25`, `_` → `%5F`, `~` → `%7E`) so the delimiter never appears
//! inside a component, and an absent conversation is written as the bare
//! marker `~`.

use std::fmt;

const DELIMITER: char = '_';
const ABSENT: &str = "~";

/// Escaped, collision-free document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(user_id: &str, conversation_id: Option<&str>) -> Self {
        let conversation = match conversation_id {
            Some(id) => escape(id),
            None => ABSENT.to_string(),
        };
        Self(format!("{}{DELIMITER}{conversation}", escape(user_id)))
    }

    /// Split a key back into `(user_id, conversation_id)`.
    pub fn parse(key: &str) -> Option<(String, Option<String>)> {
        let (user, conversation) = key.split_once(DELIMITER)?;
        let user_id = unescape(user)?;
        let conversation_id = if conversation == ABSENT {
            None
        } else {
            Some(unescape(conversation)?)
        };
        Some((user_id, conversation_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            '~' => out.push_str("%7E"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(component: &str) -> Option<String> {
    let mut out = String::with_capacity(component.len());
    let mut rest = component;
    while let Some(pos) = rest.find(['%', '_', '~']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = match tail.get(..3) {
            Some("%25") => '%',
            Some("%5F") => '_',
            Some("%7E") => '~',
            // raw delimiter or marker inside a component, or an unknown escape
            _ => return None,
        };
        out.push(decoded);
        rest = &tail[3..];
    }
    out.push_str(rest);
    Some(out)
}
