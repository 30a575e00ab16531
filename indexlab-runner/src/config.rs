//! Serializable run configuration.
//!
//! A TOML run file binds an `IndexConfig` to its input dataset. The run ID is
//! a content-addressed hash of the simulation parameters: two runs with
//! identical configurations share an ID, which keys artifact directories and
//! deduplicates sweep reporting.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use indexlab_core::{ConfigurationError, IndexConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),
}

/// A complete run description: simulation parameters plus data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub index: IndexConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the normalized JSON dataset.
    pub input: PathBuf,
}

impl RunConfig {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.index.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn run_id(&self) -> String {
        run_id(&self.index)
    }
}

/// Deterministic hash ID for a simulation configuration.
pub fn run_id(config: &IndexConfig) -> String {
    let json = serde_json::to_string(config).expect("IndexConfig serialization cannot fail");
    blake3::hash(json.as_bytes()).to_hex().to_string()
}
