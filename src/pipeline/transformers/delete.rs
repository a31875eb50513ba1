//! Delete: remove nodes by path, by value, or both.

use super::scalar_matches;
use crate::error::Result;
use crate::pipeline::transformer::Transformer;
use crate::storage::SharedStorage;
use crate::types::{OperationKind, PathSpec};
use serde_json::{Map, Value};

/// Delete transformer
///
/// A node is removed when its path, written with the configured separator
/// (`a.b[0].c`), equals the configured key and its scalar value matches the
/// configured value. An empty key or value matches any node, so with both
/// empty the whole tree is dropped.
#[derive(Debug)]
pub struct Delete {
    key: String,
    separator: String,
    value: String,
    storage: SharedStorage,
}

impl Delete {
    pub fn new(spec: &PathSpec, storage: SharedStorage) -> Self {
        Self {
            key: spec.key.clone(),
            separator: spec.separator.clone(),
            value: spec.value.clone(),
            storage,
        }
    }

    /// The value filter for `event_id`: a Storage variable holding a string
    /// replaces the literal.
    fn value_filter(&self, event_id: &str) -> Option<String> {
        if self.value.is_empty() {
            return None;
        }
        match self.storage.get(event_id, &self.value) {
            Some(Value::String(stored)) => Some(stored),
            _ => Some(self.value.clone()),
        }
    }
}

impl Transformer for Delete {
    fn operation(&self) -> OperationKind {
        OperationKind::Delete
    }

    fn transform(&self, event_id: &str, tree: &Value) -> Result<Value> {
        let filter = Filter {
            key: Some(self.key.as_str()).filter(|key| !key.is_empty()),
            separator: &self.separator,
            value: self.value_filter(event_id),
        };
        let mut trail = String::new();
        Ok(filter.prune(tree, &mut trail).unwrap_or(Value::Null))
    }
}

struct Filter<'a> {
    key: Option<&'a str>,
    separator: &'a str,
    value: Option<String>,
}

impl Filter<'_> {
    fn matches(&self, trail: &str, node: &Value) -> bool {
        let path_ok = self.key.map_or(true, |key| key == trail);
        let value_ok = self
            .value
            .as_deref()
            .map_or(true, |expected| scalar_matches(node, expected));
        path_ok && value_ok
    }

    /// Rebuild `node` without matching descendants; `None` drops the node.
    ///
    /// `trail` is the rendered path of `node`.
    fn prune(&self, node: &Value, trail: &mut String) -> Option<Value> {
        if self.matches(trail, node) {
            return None;
        }

        let rebuilt = match node {
            Value::Object(members) => {
                let mut kept = Map::new();
                for (key, child) in members {
                    let mark = trail.len();
                    if !trail.is_empty() {
                        trail.push_str(self.separator);
                    }
                    trail.push_str(key);
                    if let Some(value) = self.prune(child, trail) {
                        kept.insert(key.clone(), value);
                    }
                    trail.truncate(mark);
                }
                Value::Object(kept)
            }
            Value::Array(items) => {
                let mut kept = Vec::with_capacity(items.len());
                for (index, child) in items.iter().enumerate() {
                    let mark = trail.len();
                    trail.push_str(&format!("[{}]", index));
                    if let Some(value) = self.prune(child, trail) {
                        kept.push(value);
                    }
                    trail.truncate(mark);
                }
                Value::Array(kept)
            }
            scalar => scalar.clone(),
        };
        Some(rebuilt)
    }
}
