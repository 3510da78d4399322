//! In-memory JSON state tree fed by `STATE_UPDATE` messages.
//!
//! Paths address nested object keys; missing intermediate objects are
//! created on write, and a non-object in the way is replaced.

use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

#[derive(Clone)]
pub struct StateStore {
    root: Arc<RwLock<Value>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl StateStore {
    pub fn new(initial: Value) -> Self {
        let root = if initial.is_object() {
            initial
        } else {
            Value::Object(Map::new())
        };
        Self {
            root: Arc::new(RwLock::new(root)),
        }
    }

    /// Set `value` at `path`. An empty path replaces the whole tree.
    pub fn apply(&self, path: &[String], value: Value) {
        // Poisoned lock means a writer panicked; skip the write instead of
        // propagating the panic.
        let Ok(mut root) = self.root.write() else {
            tracing::warn!("state store lock poisoned; update dropped");
            return;
        };

        let Some((last, parents)) = path.split_last() else {
            *root = value;
            return;
        };

        let mut node = &mut *root;
        for key in parents {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = match node {
                Value::Object(map) => map
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => return,
            };
        }

        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        if let Value::Object(map) = node {
            map.insert(last.clone(), value);
        }
    }

    /// Value at `path`, if every segment exists.
    pub fn get(&self, path: &[String]) -> Option<Value> {
        let root = self.root.read().ok()?;
        let mut node = &*root;
        for key in path {
            node = node.get(key)?;
        }
        Some(node.clone())
    }

    pub fn snapshot(&self) -> Value {
        self.root
            .read()
            .map(|root| root.clone())
            .unwrap_or(Value::Null)
    }
}
