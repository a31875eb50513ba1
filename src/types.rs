//! Core configuration types for transformation pipelines
//!
//! A pipeline is described by an ordered list of [`Transform`] entries, each
//! naming an [`OperationKind`] and a list of [`PathSpec`]s. The same shape
//! is accepted from JSON (environment variables) and TOML (config files).

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Default path separator
pub const DEFAULT_SEPARATOR: &str = ".";

/// The closed set of operations a pipeline can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Assign a (possibly interpolated) value at a path
    Add,
    /// Remove nodes by path and/or value
    Delete,
    /// Move a value from one path to another
    Shift,
    /// Save a value into the event's variable storage
    Store,
    /// Decode a string leaf as nested JSON
    Parse,
}

impl OperationKind {
    /// All operation kinds, in registry order
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Add,
        OperationKind::Delete,
        OperationKind::Shift,
        OperationKind::Store,
        OperationKind::Parse,
    ];

    /// Lowercase operation name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Delete => "delete",
            OperationKind::Shift => "shift",
            OperationKind::Store => "store",
            OperationKind::Parse => "parse",
        }
    }

    /// Phase this operation runs in
    pub fn phase(&self) -> Phase {
        match self {
            OperationKind::Store | OperationKind::Parse => Phase::Init,
            OperationKind::Add | OperationKind::Delete | OperationKind::Shift => Phase::Main,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationKind {
    type Err = crate::error::TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| crate::error::TransformError::UnknownOperation(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for OperationKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Pipeline stage an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs first: loads variables and normalises input (store, parse)
    Init,
    /// Runs after every init operation (add, delete, shift)
    Main,
}

impl Phase {
    pub fn is_init(&self) -> bool {
        matches!(self, Phase::Init)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => f.write_str("init"),
            Phase::Main => f.write_str("main"),
        }
    }
}

/// One configured operation with its paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    pub operation: OperationKind,
    #[serde(default)]
    pub paths: Vec<PathSpec>,
}

impl Transform {
    pub fn new(operation: OperationKind) -> Self {
        Self {
            operation,
            paths: Vec::new(),
        }
    }

    /// Append a path with the default separator
    pub fn path(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.paths.push(PathSpec::new(key, value));
        self
    }

    /// Append a fully specified path
    pub fn with_path(mut self, path: PathSpec) -> Self {
        self.paths.push(path);
        self
    }
}

/// Key/value pair interpreted by an operation
///
/// The meaning of `key` and `value` depends on the operation; see the
/// individual transformers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSpec {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(
        default = "default_separator",
        deserialize_with = "deserialize_separator"
    )]
    pub separator: String,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn deserialize_separator<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let separator = Option::<String>::deserialize(deserializer)?;
    Ok(match separator {
        Some(s) if !s.is_empty() => s,
        _ => default_separator(),
    })
}

impl PathSpec {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            separator: default_separator(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        if !separator.is_empty() {
            self.separator = separator;
        }
        self
    }
}
