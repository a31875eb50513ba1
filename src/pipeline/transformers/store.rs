//! Store: capture a value into the event's variables.

use crate::error::{Result, TransformError};
use crate::path::{self, Path};
use crate::pipeline::transformer::Transformer;
use crate::storage::SharedStorage;
use crate::types::{OperationKind, PathSpec};
use serde_json::Value;

/// Store transformer
///
/// Reads the value at path `value` and saves it as variable `key`. A missing
/// path stores `Null`, which readers treat as undefined.
#[derive(Debug)]
pub struct Store {
    variable: String,
    path: Path,
    storage: SharedStorage,
}

impl Store {
    pub fn new(spec: &PathSpec, storage: SharedStorage) -> Result<Self> {
        if spec.key.is_empty() {
            return Err(TransformError::Config(
                "store requires a variable name".to_string(),
            ));
        }
        Ok(Self {
            variable: spec.key.clone(),
            path: Path::parse(&spec.value, &spec.separator),
            storage,
        })
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl Transformer for Store {
    fn operation(&self) -> OperationKind {
        OperationKind::Store
    }

    fn transform(&self, event_id: &str, tree: &Value) -> Result<Value> {
        let value = path::read_at(tree, &self.path)
            .cloned()
            .unwrap_or(Value::Null);
        self.storage.set(event_id, &self.variable, value);
        Ok(tree.clone())
    }
}
