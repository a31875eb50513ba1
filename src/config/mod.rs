//! Configuration module for ce-transform
//!
//! The adapter needs two transformation lists (one for the event context,
//! one for the payload) plus worker pool settings.
//!
//! # Sources
//!
//! The first source that is present wins:
//!
//! 1. a TOML file passed on the command line;
//! 2. a TOML file named by `CE_TRANSFORM_CONFIG`;
//! 3. `TRANSFORMATION_CONTEXT` / `TRANSFORMATION_DATA`, each holding a JSON
//!    array of transformations (worker count from `CE_TRANSFORM_WORKERS`);
//! 4. `config.toml` in the platform config directory:
//!    - **Linux**: `~/.config/dev.hxyulin.ce-transform/`
//!    - **macOS**: `~/Library/Application Support/dev.hxyulin.ce-transform/`
//!    - **Windows**: `%APPDATA%\dev.hxyulin.ce-transform\`
//! 5. defaults: no transformations.
//!
//! # Example
//!
//! ```toml
//! workers = 4
//!
//! [[transformation.context]]
//! operation = "add"
//! paths = [{ key = "Extensions.processed", value = "true" }]
//!
//! [[transformation.data]]
//! operation = "shift"
//! paths = [{ key = ".:body" }]
//! ```

use crate::error::{Result, TransformError};
use crate::types::Transform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Application identifier for the config directory
pub const APP_ID: &str = "dev.hxyulin.ce-transform";

/// Config filename inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "CE_TRANSFORM_CONFIG";

/// Environment variable with the context transformations (JSON)
pub const CONTEXT_ENV: &str = "TRANSFORMATION_CONTEXT";

/// Environment variable with the data transformations (JSON)
pub const DATA_ENV: &str = "TRANSFORMATION_DATA";

/// Environment variable overriding the worker count
pub const WORKERS_ENV: &str = "CE_TRANSFORM_WORKERS";

/// Default capacity of the event queue between reader and workers
pub const DEFAULT_QUEUE_SIZE: usize = 256;

// ==================== Config Directory ====================

/// Get the application config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Transformation Config ====================

/// Transformations applied to the context and to the payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformationConfig {
    #[serde(default)]
    pub context: Vec<Transform>,

    #[serde(default)]
    pub data: Vec<Transform>,
}

impl TransformationConfig {
    /// Parse the two JSON arrays used by the environment interface.
    ///
    /// A blank string is an empty list.
    pub fn from_json(context: &str, data: &str) -> Result<Self> {
        Ok(Self {
            context: parse_transform_list(CONTEXT_ENV, context)?,
            data: parse_transform_list(DATA_ENV, data)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_empty() && self.data.is_empty()
    }
}

fn parse_transform_list(name: &str, json: &str) -> Result<Vec<Transform>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json)
        .map_err(|e| TransformError::Config(format!("Failed to parse {}: {}", name, e)))
}

// ==================== Adapter Config ====================

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    EnvFile(PathBuf),
    Environment,
    ConfigDir(PathBuf),
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CommandLine(path) => write!(f, "command line ({})", path.display()),
            ConfigSource::EnvFile(path) => {
                write!(f, "{} ({})", CONFIG_PATH_ENV, path.display())
            }
            ConfigSource::Environment => write!(f, "{}/{}", CONTEXT_ENV, DATA_ENV),
            ConfigSource::ConfigDir(path) => write!(f, "config dir ({})", path.display()),
            ConfigSource::Default => f.write_str("defaults"),
        }
    }
}

/// Complete adapter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Number of worker threads transforming events
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the queue feeding the workers
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    #[serde(default)]
    pub transformation: TransformationConfig,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_queue_size() -> usize {
    DEFAULT_QUEUE_SIZE
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_size: default_queue_size(),
            transformation: TransformationConfig::default(),
        }
    }
}

impl AdapterConfig {
    pub fn new(transformation: TransformationConfig) -> Self {
        Self {
            transformation,
            ..Default::default()
        }
    }

    /// Load a TOML config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TransformError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            TransformError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.validated()
    }

    /// Save the config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                TransformError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| TransformError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            TransformError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Build a config from the environment interface.
    ///
    /// Returns `None` when neither transformation variable is set.
    pub fn from_env() -> Result<Option<Self>> {
        let context = std::env::var(CONTEXT_ENV).ok();
        let data = std::env::var(DATA_ENV).ok();
        if context.is_none() && data.is_none() {
            return Ok(None);
        }

        let transformation = TransformationConfig::from_json(
            context.as_deref().unwrap_or_default(),
            data.as_deref().unwrap_or_default(),
        )?;
        let mut config = Self::new(transformation);

        if let Ok(workers) = std::env::var(WORKERS_ENV) {
            config.workers = workers.trim().parse().map_err(|e| {
                TransformError::Config(format!("Invalid {} {:?}: {}", WORKERS_ENV, workers, e))
            })?;
        }

        config.validated().map(Some)
    }

    /// Resolve the active configuration from all sources, in priority order.
    pub fn resolve(cli_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = cli_path {
            let config = Self::load(path)?;
            return Ok((config, ConfigSource::CommandLine(path.to_path_buf())));
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            let config = Self::load(&path)?;
            return Ok((config, ConfigSource::EnvFile(path)));
        }

        if let Some(config) = Self::from_env()? {
            return Ok((config, ConfigSource::Environment));
        }

        if let Some(path) = default_config_path().filter(|p| p.exists()) {
            let config = Self::load(&path)?;
            return Ok((config, ConfigSource::ConfigDir(path)));
        }

        Ok((Self::default(), ConfigSource::Default))
    }

    fn validated(self) -> Result<Self> {
        if self.workers == 0 {
            return Err(TransformError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.queue_size == 0 {
            return Err(TransformError::Config(
                "queue_size must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}
