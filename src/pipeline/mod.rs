//! Transformation pipeline.
//!
//! A pipeline is an ordered list of operations applied to a JSON tree:
//!
//! ```text
//! bytes ──► decode ──► [store] ──► [parse] ──► … init phase
//!                  ──► [add] ──► [delete] ──► [shift] ──► … main phase
//!                  ──► encode ──► bytes
//! ```
//!
//! # Design
//!
//! - **Enum dispatch**: `BuiltinTransformer` wraps the five operations.
//! - **Immutable after construction**: transformers never mutate
//!   themselves; per-event state lives in the shared `Storage`.
//! - **Two phases**: init operations (store, parse) always run before main
//!   operations (add, delete, shift), whatever their declared order.
//! - **Errors are collected**: a failing step is skipped, later steps still
//!   run and the caller receives every error.

pub mod executor;
pub mod transformer;
pub mod transformers;

pub use executor::{PhaseOutput, Pipeline, TreeOutput};
pub use transformer::{BuiltinTransformer, Transformer};
pub use transformers::{interpolate, Add, Delete, Parse, ParseFormat, Shift, Store};
