//! Error handling for ce-transform
//!
//! This module defines the error type shared by the path codec, the
//! transformers, the pipeline and the event handler, plus a Result alias.

use crate::types::OperationKind;
use thiserror::Error;

/// Main error type for transformation operations
#[derive(Error, Debug)]
pub enum TransformError {
    /// Operation name outside the known set
    #[error("Unknown operation: {0:?}")]
    UnknownOperation(String),

    /// Shift key that is not of the form `oldPath:newPath`
    #[error("Malformed shift key {0:?}: expected \"oldPath:newPath\"")]
    MalformedShiftKey(String),

    /// Parse format other than `json`
    #[error("Unsupported parse format {0:?}")]
    UnsupportedParseFormat(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input bytes are not a valid JSON tree
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Transformed tree could not be serialized
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Non-fatal failure of a single configured operation
    #[error("{operation} {path:?}: {message}")]
    Operation {
        operation: OperationKind,
        path: String,
        message: String,
    },

    /// Errors collected over one pipeline phase
    #[error("{}", join_errors(.0))]
    Aggregate(Vec<TransformError>),

    /// Event payload is not JSON
    #[error("Content type {0:?} is not supported")]
    UnsupportedContentType(String),

    /// Event that cannot be decoded or reassembled
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TransformError>,
    },
}

fn join_errors(errors: &[TransformError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TransformError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TransformError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a per-operation error
    pub fn operation(
        operation: OperationKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        TransformError::Operation {
            operation,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Collapse collected errors: none, a single error, or an aggregate.
    pub fn aggregate(mut errors: Vec<TransformError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(TransformError::Aggregate(errors)),
        }
    }

    /// Whether this error was raised while building a pipeline
    pub fn is_configuration(&self) -> bool {
        match self {
            TransformError::UnknownOperation(_)
            | TransformError::MalformedShiftKey(_)
            | TransformError::UnsupportedParseFormat(_)
            | TransformError::Config(_) => true,
            TransformError::WithContext { source, .. } => source.is_configuration(),
            _ => false,
        }
    }
}

/// Result type alias for ce-transform operations
pub type Result<T> = std::result::Result<T, TransformError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
