//! # ce-transform: declarative CloudEvent transformation
//!
//! Rewrites the attributes and JSON payload of CloudEvents with an ordered
//! list of declarative operations: `add`, `delete`, `shift`, `store` and
//! `parse`.
//!
//! ## Architecture
//!
//! - **Path codec**: addresses locations in a JSON tree (`a.b[2].c`) and
//!   builds/merges/extracts values at them
//! - **Pipeline**: ordered transformers run in two phases (init, then main)
//! - **Storage**: per-event variables shared between the context and data
//!   pipelines, flushed once the event is done
//! - **Handler**: applies both pipelines to one CloudEvent
//! - **Adapter**: NDJSON reader feeding a crossbeam worker pool
//!
//! ## Configuration
//!
//! Transformations come from a TOML file or from the
//! `TRANSFORMATION_CONTEXT` / `TRANSFORMATION_DATA` environment variables.
//! See [`config`] for the lookup order.
//!
//! ## Example
//!
//! ```
//! use ce_transform::{CloudEvent, Handler, OperationKind, Transform};
//! use serde_json::json;
//!
//! let data = [
//!     Transform::new(OperationKind::Store).path("$user", "user.name"),
//!     Transform::new(OperationKind::Add).path("greeting", "Hello, $user!"),
//! ];
//! let handler = Handler::new(&[], &data).unwrap();
//!
//! let event = CloudEvent::new("1", "example", "demo")
//!     .with_data(json!({"user": {"name": "Ada"}}));
//! let out = handler.transform(event).unwrap();
//!
//! assert_eq!(out.event.data.unwrap()["greeting"], json!("Hello, Ada!"));
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod path;
pub mod pipeline;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use adapter::{Adapter, AdapterStats, EventSink, WriterSink};
pub use config::{AdapterConfig, TransformationConfig};
pub use error::{Result, ResultExt, TransformError};
pub use event::{CloudEvent, EventContext};
pub use handler::{Handler, Transformed};
pub use path::Path;
pub use pipeline::{BuiltinTransformer, Pipeline, Transformer};
pub use storage::{SharedStorage, Storage};
pub use types::{OperationKind, PathSpec, Phase, Transform};
