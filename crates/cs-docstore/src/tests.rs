use crate::*;
use cs_core::error::StoreError;
use cs_core::types::Document;
use serde_json::{json, Value};

fn doc(v: Value) -> Document {
    v.as_object().cloned().unwrap()
}

fn snap(key: &str, v: Value) -> DocumentSnapshot {
    DocumentSnapshot::new(key, doc(v))
}

// ========== Query ==========

#[test]
fn test_query_equality_filter() {
    let q = Query::where_eq("user_id", "u1");
    assert!(q.matches(&doc(json!({"user_id": "u1"}))));
    assert!(!q.matches(&doc(json!({"user_id": "u2"}))));
    assert!(!q.matches(&doc(json!({"other": "u1"}))));
}

#[test]
fn test_query_equality_is_type_strict() {
    let q = Query::where_eq("n", 3);
    assert!(q.matches(&doc(json!({"n": 3}))));
    assert!(!q.matches(&doc(json!({"n": "3"}))));
    assert!(!Query::where_eq("flag", true).matches(&doc(json!({"flag": "true"}))));
}

#[test]
fn test_query_order_and_limit() {
    let docs = vec![
        snap("a", json!({"u": "x", "t": "2024-01-02"})),
        snap("b", json!({"u": "x", "t": "2024-01-03"})),
        snap("c", json!({"u": "x", "t": "2024-01-01"})),
        snap("d", json!({"u": "y", "t": "2024-01-09"})),
    ];
    let q = Query::where_eq("u", "x").order_by("t", Direction::Descending).limit(2);
    let keys: Vec<_> = q.apply(docs.clone()).into_iter().map(|d| d.key).collect();
    assert_eq!(keys, vec!["b", "a"]);

    let q = Query::where_eq("u", "x").order_by("t", Direction::Ascending);
    let keys: Vec<_> = q.apply(docs).into_iter().map(|d| d.key).collect();
    assert_eq!(keys, vec!["c", "a", "b"]);
}

#[test]
fn test_query_missing_order_field_sorts_last() {
    let docs = vec![
        snap("none", json!({"u": "x"})),
        snap("one", json!({"u": "x", "t": 1})),
        snap("two", json!({"u": "x", "t": 2})),
    ];
    for dir in [Direction::Ascending, Direction::Descending] {
        let out = Query::where_eq("u", "x").order_by("t", dir).apply(docs.clone());
        assert_eq!(out.last().unwrap().key, "none");
    }
}

#[test]
fn test_query_mixed_types_order_by_type() {
    let mut docs: Vec<_> = (0..200)
        .map(|i| snap(&format!("s{i}"), json!({"u": "x", "t": format!("{i:03}")})))
        .collect();
    docs.insert(0, snap("num", json!({"u": "x", "t": 0})));
    docs.insert(100, snap("null", json!({"u": "x", "t": null})));

    let q = Query::where_eq("u", "x").order_by("t", Direction::Descending).limit(3);
    let keys: Vec<_> = q.apply(docs.clone()).into_iter().map(|d| d.key).collect();
    assert_eq!(keys, vec!["s199", "s198", "s197"]);

    let q = Query::where_eq("u", "x").order_by("t", Direction::Ascending).limit(3);
    let keys: Vec<_> = q.apply(docs).into_iter().map(|d| d.key).collect();
    assert_eq!(keys, vec!["null", "num", "s0"]);
}

#[test]
fn test_query_limit_zero() {
    let docs = vec![snap("a", json!({"u": "x"}))];
    assert!(Query::where_eq("u", "x").limit(0).apply(docs).is_empty());
}

// ========== MemoryCollection ==========

#[tokio::test]
async fn test_memory_set_get() {
    let c = MemoryCollection::new("sessions");
    assert_eq!(c.name(), "sessions");
    c.set("k1", doc(json!({"a": 1}))).await.unwrap();
    let got = c.get("k1").await.unwrap().unwrap();
    assert_eq!(got.key, "k1");
    assert_eq!(got.fields["a"], json!(1));
    assert!(c.get("missing").await.unwrap().is_none());
    c.set("k0", doc(json!({"a": 0}))).await.unwrap();
    assert_eq!(c.keys(), vec!["k0".to_string(), "k1".to_string()]);
}

#[tokio::test]
async fn test_memory_set_overwrites_whole_document() {
    let c = MemoryCollection::new("s");
    c.set("k", doc(json!({"a": 1, "b": 2}))).await.unwrap();
    c.set("k", doc(json!({"a": 3}))).await.unwrap();
    let got = c.get("k").await.unwrap().unwrap();
    assert_eq!(got.fields, doc(json!({"a": 3})));
    assert_eq!(c.len(), 1);
}

#[tokio::test]
async fn test_memory_update_merges() {
    let c = MemoryCollection::new("s");
    c.set("k", doc(json!({"a": 1, "b": 2}))).await.unwrap();
    c.update("k", doc(json!({"b": 5, "flag": true}))).await.unwrap();
    let got = c.get("k").await.unwrap().unwrap();
    assert_eq!(got.fields, doc(json!({"a": 1, "b": 5, "flag": true})));
}

#[tokio::test]
async fn test_memory_update_missing_is_not_found() {
    let c = MemoryCollection::new("s");
    let err = c.update("nope", doc(json!({"x": 1}))).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { ref key } if key == "nope"));
    assert!(c.is_empty());
}

#[tokio::test]
async fn test_memory_query() {
    let c = MemoryCollection::new("s");
    for (k, u, t) in [("1", "a", 1), ("2", "a", 3), ("3", "b", 2), ("4", "a", 2)] {
        c.set(k, doc(json!({"u": u, "t": t}))).await.unwrap();
    }
    let q = Query::where_eq("u", "a").order_by("t", Direction::Descending).limit(2);
    let keys: Vec<_> = c.query(&q).await.unwrap().into_iter().map(|d| d.key).collect();
    assert_eq!(keys, vec!["2", "4"]);
}

#[tokio::test]
async fn test_memory_close_rejects_calls() {
    let c = MemoryCollection::new("s");
    c.close().await.unwrap();
    assert!(matches!(c.get("k").await, Err(StoreError::Closed(_))));
    assert!(matches!(c.set("k", Document::new()).await, Err(StoreError::Closed(_))));
    assert!(matches!(c.query(&Query::where_eq("a", 1)).await, Err(StoreError::Closed(_))));
}

// ========== FileCollection ==========

#[tokio::test]
async fn test_file_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let c = FileCollection::open(dir.path(), "sessions").await.unwrap();
        assert!(c.is_empty());
        c.set("k1", doc(json!({"user_id": "u", "n": 1}))).await.unwrap();
        c.update("k1", doc(json!({"is_expired": true}))).await.unwrap();
        c.close().await.unwrap();
    }
    let c = FileCollection::open(dir.path(), "sessions").await.unwrap();
    assert_eq!(c.len(), 1);
    let got = c.get("k1").await.unwrap().unwrap();
    assert_eq!(got.fields["is_expired"], json!(true));
    assert!(c.path().ends_with("sessions.json"));
}

#[tokio::test]
async fn test_file_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let c = FileCollection::open(dir.path(), "s").await.unwrap();
    for i in 0..5 {
        c.set(&format!("k{i}"), doc(json!({"i": i}))).await.unwrap();
    }
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["s.json".to_string()]);
}

#[tokio::test]
async fn test_file_failed_write_is_not_visible() {
    let dir = tempfile::tempdir().unwrap();
    let c = FileCollection::open(dir.path(), "s").await.unwrap();
    c.set("kept", doc(json!({"a": 1}))).await.unwrap();

    // a non-empty directory in place of the data file makes the rename fail
    std::fs::remove_file(c.path()).unwrap();
    std::fs::create_dir(c.path()).unwrap();
    std::fs::write(c.path().join("blocker"), b"x").unwrap();

    assert!(c.set("lost", doc(json!({"a": 2}))).await.is_err());
    assert!(c.get("lost").await.unwrap().is_none());
    assert!(c.update("kept", doc(json!({"a": 3}))).await.is_err());
    assert_eq!(c.get("kept").await.unwrap().unwrap().fields["a"], json!(1));

    std::fs::remove_dir_all(c.path()).unwrap();
    c.set("next", doc(json!({"a": 4}))).await.unwrap();
    c.close().await.unwrap();

    let reopened = FileCollection::open(dir.path(), "s").await.unwrap();
    assert!(reopened.get("lost").await.unwrap().is_none());
    assert_eq!(reopened.get("kept").await.unwrap().unwrap().fields["a"], json!(1));
    assert!(reopened.get("next").await.unwrap().is_some());
}

#[tokio::test]
async fn test_file_update_missing_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let c = FileCollection::open(dir.path(), "s").await.unwrap();
    assert!(matches!(c.update("nope", doc(json!({"x": 1}))).await, Err(StoreError::NotFound { .. })));
    assert!(c.is_empty());
}

#[tokio::test]
async fn test_file_rejects_foreign_collection() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("s.json"), r#"{"collection": "other", "documents": {}}"#).unwrap();
    assert!(matches!(FileCollection::open(dir.path(), "s").await, Err(StoreError::Backend(_))));
}

#[tokio::test]
async fn test_file_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("s.json"), "{not json").unwrap();
    assert!(matches!(FileCollection::open(dir.path(), "s").await, Err(StoreError::Serialization(_))));
}

#[tokio::test]
async fn test_open_collection_from_config() {
    use cs_core::config::{BackendConfig, SessionStoreConfig};

    let mem = open_collection(&SessionStoreConfig::default()).await.unwrap();
    assert_eq!(mem.name(), "conversation_sessions");

    let dir = tempfile::tempdir().unwrap();
    let config = SessionStoreConfig::default().with_backend(BackendConfig::File { path: dir.path().to_path_buf() });
    let file = open_collection(&config).await.unwrap();
    file.set("k", doc(json!({"a": 1}))).await.unwrap();
    assert!(dir.path().join("conversation_sessions.json").exists());
}
