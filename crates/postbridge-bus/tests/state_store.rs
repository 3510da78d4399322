#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::json;

use postbridge_bus::store::StateStore;

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

#[test]
fn non_object_seed_becomes_empty_tree() {
    let store = StateStore::new(json!([1, 2]));
    assert_eq!(store.snapshot(), json!({}));
}

#[test]
fn apply_creates_missing_parents() {
    let store = StateStore::new(json!({}));
    store.apply(&path(&["a", "b", "c"]), json!(3));
    assert_eq!(store.snapshot(), json!({ "a": { "b": { "c": 3 } } }));
    assert_eq!(store.get(&path(&["a", "b"])), Some(json!({ "c": 3 })));
}

#[test]
fn apply_replaces_scalar_in_the_way() {
    let store = StateStore::new(json!({ "a": 1 }));
    store.apply(&path(&["a", "b"]), json!(true));
    assert_eq!(store.get(&path(&["a", "b"])), Some(json!(true)));
}

#[test]
fn empty_path_replaces_root() {
    let store = StateStore::new(json!({ "old": 1 }));
    store.apply(&[], json!({ "new": 2 }));
    assert_eq!(store.snapshot(), json!({ "new": 2 }));
}

#[test]
fn get_missing_is_none() {
    let store = StateStore::new(json!({ "a": { "b": 1 } }));
    assert_eq!(store.get(&path(&["a", "x"])), None);
    assert_eq!(store.get(&path(&["a", "b", "c"])), None);
}

#[test]
fn default_store_is_an_empty_tree() {
    assert_eq!(StateStore::default().snapshot(), json!({}));
}
