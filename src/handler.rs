//! Event handler: runs the context and data pipelines over one CloudEvent.
//!
//! Per event:
//! 1. init phase on the context tree, then on the data tree;
//! 2. main phase on the context tree, then on the data tree;
//! 3. the event is rebuilt from both trees;
//! 4. the event's variables are flushed from Storage.
//!
//! Errors from individual operations do not reject the event. They are
//! logged and returned next to the transformed event.

use crate::config::TransformationConfig;
use crate::error::{Result, ResultExt, TransformError};
use crate::event::{CloudEvent, EventContext};
use crate::pipeline::{PhaseOutput, Pipeline};
use crate::storage::{EventScope, SharedStorage, Storage};
use crate::types::{Phase, Transform};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// A transformed event with any non-fatal errors collected on the way
#[derive(Debug)]
pub struct Transformed {
    pub event: CloudEvent,
    pub error: Option<TransformError>,
}

impl Transformed {
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }
}

/// Context and data pipelines sharing one variable Storage
#[derive(Debug)]
pub struct Handler {
    context_pipeline: Pipeline,
    data_pipeline: Pipeline,
    storage: SharedStorage,
    /// Suffix that keeps Storage keys unique across redelivered event ids
    sequence: AtomicU64,
}

impl Handler {
    pub fn new(context: &[Transform], data: &[Transform]) -> Result<Self> {
        Self::with_storage(context, data, Storage::shared())
    }

    pub fn with_storage(
        context: &[Transform],
        data: &[Transform],
        storage: SharedStorage,
    ) -> Result<Self> {
        let context_pipeline =
            Pipeline::new(context, storage.clone()).context("context pipeline")?;
        let data_pipeline = Pipeline::new(data, storage.clone()).context("data pipeline")?;

        tracing::info!(
            "Handler ready: {} context and {} data transformers",
            context_pipeline.len(),
            data_pipeline.len()
        );

        Ok(Self {
            context_pipeline,
            data_pipeline,
            storage,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &TransformationConfig) -> Result<Self> {
        Self::new(&config.context, &config.data)
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn context_pipeline(&self) -> &Pipeline {
        &self.context_pipeline
    }

    pub fn data_pipeline(&self) -> &Pipeline {
        &self.data_pipeline
    }

    fn next_storage_id(&self, event_id: &str) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}#{}", event_id, sequence)
    }

    /// Transform one event.
    ///
    /// Returns `Err` only when the event cannot be processed at all: a
    /// non-JSON payload or a context that no longer forms a valid event.
    pub fn transform(&self, event: CloudEvent) -> Result<Transformed> {
        if !event.has_json_data() {
            let content_type = event.datacontenttype.unwrap_or_default();
            tracing::warn!("Event {}: content type {:?} is not supported", event.id, content_type);
            return Err(TransformError::UnsupportedContentType(content_type));
        }

        let scope = EventScope::new(&self.storage, self.next_storage_id(&event.id));
        let storage_id = scope.event_id();

        let context_bytes =
            serde_json::to_vec(&event.context()).map_err(TransformError::Encode)?;
        let data_bytes = event.data_bytes()?;
        let had_data = event.data.is_some();

        let mut errors = Vec::new();
        let mut collect = |output: PhaseOutput| {
            errors.extend(output.error);
            output.data
        };

        let context_bytes =
            collect(self.context_pipeline.apply(storage_id, &context_bytes, Phase::Init));
        let data_bytes = collect(self.data_pipeline.apply(storage_id, &data_bytes, Phase::Init));
        let context_bytes =
            collect(self.context_pipeline.apply(storage_id, &context_bytes, Phase::Main));
        let data_bytes = collect(self.data_pipeline.apply(storage_id, &data_bytes, Phase::Main));

        let context: EventContext = serde_json::from_slice(&context_bytes).map_err(|e| {
            TransformError::InvalidEvent(format!("cannot decode transformed context: {}", e))
        })?;
        let data: Value = serde_json::from_slice(&data_bytes).map_err(TransformError::Decode)?;
        // an event without payload stays without one unless a transformer added it
        let data = match (had_data, data) {
            (false, Value::Null) => None,
            (_, data) => Some(data),
        };
        let event = CloudEvent::from_parts(context, data)?;

        let error = TransformError::aggregate(errors);
        if let Some(e) = &error {
            tracing::warn!("Event {}: transformation errors: {}", event.id, e);
        } else {
            tracing::debug!("Event {}: transformed", event.id);
        }

        Ok(Transformed { event, error })
    }
}
