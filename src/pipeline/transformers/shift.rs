//! Shift: move a value from one path to another.

use super::{resolve_variable, scalar_matches};
use crate::error::{Result, TransformError};
use crate::path::{self, Path};
use crate::pipeline::transformer::Transformer;
use crate::storage::SharedStorage;
use crate::types::{OperationKind, PathSpec};
use serde_json::Value;

/// Separates the source and destination paths in a shift key.
pub const SHIFT_DELIMITER: &str = ":";

/// Shift transformer
///
/// The key has the form `from:to`. With a non-empty value the move only
/// happens when the extracted value matches it.
#[derive(Debug)]
pub struct Shift {
    from: Path,
    to: Path,
    value: String,
    storage: SharedStorage,
}

impl Shift {
    pub fn new(spec: &PathSpec, storage: SharedStorage) -> Result<Self> {
        let mut parts = spec.key.split(SHIFT_DELIMITER);
        let (Some(from), Some(to), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TransformError::MalformedShiftKey(spec.key.clone()));
        };

        let to = Path::parse(to, &spec.separator);
        to.ensure_encodable()?;

        Ok(Self {
            from: Path::parse(from, &spec.separator),
            to,
            value: spec.value.clone(),
            storage,
        })
    }

    pub fn from(&self) -> &Path {
        &self.from
    }

    pub fn to(&self) -> &Path {
        &self.to
    }

    fn condition_holds(&self, event_id: &str, extracted: &Value) -> bool {
        if self.value.is_empty() {
            return true;
        }
        match resolve_variable(&self.storage, event_id, &self.value) {
            Some(stored) => stored == *extracted,
            None => scalar_matches(extracted, &self.value),
        }
    }
}

impl Transformer for Shift {
    fn operation(&self) -> OperationKind {
        OperationKind::Shift
    }

    fn transform(&self, event_id: &str, tree: &Value) -> Result<Value> {
        let (remaining, extracted) = path::extract_at(tree, &self.from);
        let Some(extracted) = extracted else {
            return Ok(tree.clone());
        };
        if !self.condition_holds(event_id, &extracted) {
            return Ok(tree.clone());
        }
        Ok(path::assign(remaining, &self.to, extracted))
    }
}
