//! Filtered, ordered, limited queries over a document collection.
//!
//! Supports: one equality filter, ordering by one field, and a result limit.

use cs_core::types::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A stored document together with the key used to address it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub key: String,
    pub fields: Document,
}

impl DocumentSnapshot {
    pub fn new(key: impl Into<String>, fields: Document) -> Self {
        Self { key: key.into(), fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub field: String,
    pub value: Value,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    /// Documents whose `field` equals `value`.
    pub fn where_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            order: None,
            limit: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, fields: &Document) -> bool {
        fields.get(&self.field).is_some_and(|v| v == &self.value)
    }

    /// Evaluate the query over an in-memory set of snapshots.
    pub fn apply(&self, docs: impl IntoIterator<Item = DocumentSnapshot>) -> Vec<DocumentSnapshot> {
        let mut hits: Vec<DocumentSnapshot> = docs.into_iter().filter(|d| self.matches(&d.fields)).collect();

        if let Some((field, direction)) = &self.order {
            // stable sort; documents lacking the field go last either way
            hits.sort_by(|a, b| match (a.get(field), b.get(field)) {
                (Some(va), Some(vb)) => {
                    let ord = compare_values(va, vb);
                    match direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            });
        }

        if let Some(n) = self.limit {
            hits.truncate(n);
        }
        hits
    }
}

/// Values of different JSON types order by type rank, so a stray number
/// never interleaves with timestamp strings.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(sa), Value::String(sb)) => sa.cmp(sb),
        (Value::Bool(ba), Value::Bool(bb)) => ba.cmp(bb),
        (Value::Number(na), Value::Number(nb)) => {
            let (fa, fb) = (na.as_f64().unwrap_or(f64::NAN), nb.as_f64().unwrap_or(f64::NAN));
            fa.total_cmp(&fb)
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
