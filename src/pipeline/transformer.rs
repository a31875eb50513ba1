//! Transformer abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`Transformer` trait**: the contract every operation implements.
//! - **`BuiltinTransformer` enum**: closed set of the five operations. The
//!   pipeline stores this enum, so dispatch is a match instead of a vtable
//!   call and an unregistered operation cannot exist at runtime.

use crate::error::{Result, TransformError};
use crate::pipeline::transformers::{Add, Delete, Parse, Shift, Store};
use crate::storage::SharedStorage;
use crate::types::{OperationKind, PathSpec, Phase};
use serde_json::Value;

/// A configured, stateless operation over a JSON tree.
pub trait Transformer: Send + Sync {
    /// Which operation this is.
    fn operation(&self) -> OperationKind;

    /// Transform a decoded tree. A missing path is a no-op, not an error.
    fn transform(&self, event_id: &str, tree: &Value) -> Result<Value>;

    /// Human-readable name, used in logs.
    fn name(&self) -> &str {
        self.operation().as_str()
    }

    fn phase(&self) -> Phase {
        self.operation().phase()
    }

    fn is_init_phase(&self) -> bool {
        self.phase().is_init()
    }

    /// Decode `data`, transform it and re-encode the result.
    fn apply(&self, event_id: &str, data: &[u8]) -> Result<Vec<u8>> {
        let tree: Value = serde_json::from_slice(data).map_err(TransformError::Decode)?;
        let output = self.transform(event_id, &tree)?;
        serde_json::to_vec(&output).map_err(TransformError::Encode)
    }
}

/// Enum dispatch for the built-in operations.
#[derive(Debug)]
pub enum BuiltinTransformer {
    Add(Add),
    Delete(Delete),
    Shift(Shift),
    Store(Store),
    Parse(Parse),
}

impl BuiltinTransformer {
    /// Build the transformer for `operation` from one configured path.
    pub fn configure(
        operation: OperationKind,
        spec: &PathSpec,
        storage: SharedStorage,
    ) -> Result<Self> {
        Ok(match operation {
            OperationKind::Add => BuiltinTransformer::Add(Add::new(spec, storage)?),
            OperationKind::Delete => BuiltinTransformer::Delete(Delete::new(spec, storage)),
            OperationKind::Shift => BuiltinTransformer::Shift(Shift::new(spec, storage)?),
            OperationKind::Store => BuiltinTransformer::Store(Store::new(spec, storage)?),
            OperationKind::Parse => BuiltinTransformer::Parse(Parse::new(spec)?),
        })
    }
}

impl Transformer for BuiltinTransformer {
    fn operation(&self) -> OperationKind {
        match self {
            BuiltinTransformer::Add(_) => OperationKind::Add,
            BuiltinTransformer::Delete(_) => OperationKind::Delete,
            BuiltinTransformer::Shift(_) => OperationKind::Shift,
            BuiltinTransformer::Store(_) => OperationKind::Store,
            BuiltinTransformer::Parse(_) => OperationKind::Parse,
        }
    }

    fn transform(&self, event_id: &str, tree: &Value) -> Result<Value> {
        match self {
            BuiltinTransformer::Add(t) => t.transform(event_id, tree),
            BuiltinTransformer::Delete(t) => t.transform(event_id, tree),
            BuiltinTransformer::Shift(t) => t.transform(event_id, tree),
            BuiltinTransformer::Store(t) => t.transform(event_id, tree),
            BuiltinTransformer::Parse(t) => t.transform(event_id, tree),
        }
    }
}
