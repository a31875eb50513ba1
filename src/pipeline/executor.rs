//! Pipeline executor: runs configured transformers over an event payload.
//!
//! Each invocation runs one phase:
//! 1. Skip entirely when no transformer belongs to the phase.
//! 2. Decode the payload once.
//! 3. Run the phase's transformers in declared order; a failing step keeps
//!    the tree from before it and its error is collected.
//! 4. Encode the final tree.

use crate::error::{Result, ResultExt, TransformError};
use crate::pipeline::transformer::{BuiltinTransformer, Transformer};
use crate::storage::SharedStorage;
use crate::types::{Phase, Transform};
use serde_json::Value;

/// Result of running one phase over a payload.
///
/// `data` is always usable: when decoding or encoding fails it holds the
/// original input.
#[derive(Debug)]
pub struct PhaseOutput {
    pub data: Vec<u8>,
    pub error: Option<TransformError>,
}

impl PhaseOutput {
    fn unchanged(data: &[u8], error: Option<TransformError>) -> Self {
        Self {
            data: data.to_vec(),
            error,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Tree-level counterpart of [`PhaseOutput`].
#[derive(Debug)]
pub struct TreeOutput {
    pub tree: Value,
    pub errors: Vec<TransformError>,
}

/// An ordered, immutable list of transformers sharing one Storage.
#[derive(Debug)]
pub struct Pipeline {
    transformers: Vec<BuiltinTransformer>,
    storage: SharedStorage,
}

impl Pipeline {
    /// Build one transformer per configured path, in declaration order.
    pub fn new(transforms: &[Transform], storage: SharedStorage) -> Result<Self> {
        let mut transformers = Vec::new();
        for (index, transform) in transforms.iter().enumerate() {
            for spec in &transform.paths {
                let transformer =
                    BuiltinTransformer::configure(transform.operation, spec, storage.clone())
                        .with_context(|| {
                            format!("transformation #{} ({})", index, transform.operation)
                        })?;
                transformers.push(transformer);
            }
        }

        tracing::debug!("Built pipeline with {} transformers", transformers.len());
        Ok(Self {
            transformers,
            storage,
        })
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Number of transformers that run in `phase`.
    pub fn phase_len(&self, phase: Phase) -> usize {
        self.phase_transformers(phase).count()
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    fn phase_transformers(&self, phase: Phase) -> impl Iterator<Item = &BuiltinTransformer> {
        self.transformers
            .iter()
            .filter(move |t| t.phase() == phase)
    }

    /// Run the transformers of `phase` over a serialized payload.
    pub fn apply(&self, event_id: &str, data: &[u8], phase: Phase) -> PhaseOutput {
        if self.phase_len(phase) == 0 {
            return PhaseOutput::unchanged(data, None);
        }

        let tree: Value = match serde_json::from_slice(data) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("Event {}: payload is not JSON: {}", event_id, e);
                return PhaseOutput::unchanged(data, Some(TransformError::Decode(e)));
            }
        };

        let TreeOutput { tree, errors } = self.apply_tree(event_id, tree, phase);

        match serde_json::to_vec(&tree) {
            Ok(encoded) => PhaseOutput {
                data: encoded,
                error: TransformError::aggregate(errors),
            },
            Err(e) => {
                let mut errors = errors;
                errors.push(TransformError::Encode(e));
                PhaseOutput::unchanged(data, TransformError::aggregate(errors))
            }
        }
    }

    /// Run the transformers of `phase` over a decoded tree.
    pub fn apply_tree(&self, event_id: &str, tree: Value, phase: Phase) -> TreeOutput {
        let mut tree = tree;
        let mut errors = Vec::new();

        for transformer in self.phase_transformers(phase) {
            match transformer.transform(event_id, &tree) {
                Ok(next) => {
                    tracing::debug!("Event {}: {} applied", event_id, transformer.name());
                    tree = next;
                }
                Err(e) => {
                    tracing::warn!("Event {}: {} failed: {}", event_id, transformer.name(), e);
                    errors.push(e);
                }
            }
        }

        TreeOutput { tree, errors }
    }

    /// Run both phases back to back.
    pub fn apply_all(&self, event_id: &str, data: &[u8]) -> PhaseOutput {
        let init = self.apply(event_id, data, Phase::Init);
        let main = self.apply(event_id, &init.data, Phase::Main);

        let errors: Vec<TransformError> = init.error.into_iter().chain(main.error).collect();
        PhaseOutput {
            data: main.data,
            error: TransformError::aggregate(errors),
        }
    }
}
