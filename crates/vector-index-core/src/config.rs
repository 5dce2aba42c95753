//! Layered build/search configuration.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`VECTOR_INDEX_*`)
//! 2. Configuration file (`vector-index.toml`)
//! 3. Default values
//!
//! Engine constructors never require a config file — they take plain
//! parameter structs (see `crate::index::hnsw::HnswParams` and friends).
//! [`IndexConfig`] exists for callers (notably the CLI) that want named
//! presets or environment-driven overrides instead of hand-built structs.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors produced while loading or validating an [`IndexConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The layered `figment` sources failed to parse or merge.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A loaded value failed validation.
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Dotted path of the offending key (e.g. `hnsw.m`).
        key: String,
        /// Description of the failed check.
        message: String,
    },
}

/// HNSW build/search configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HnswConfig {
    /// Max connections per node on layers ≥ 1 (M).
    pub m: usize,
    /// Max connections per node on layer 0 (M0).
    pub m0: usize,
    /// Candidate pool size during construction.
    pub ef_construction: usize,
    /// Candidate pool size during search.
    pub ef_search: usize,
    /// RNG seed for layer sampling.
    pub seed: u64,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            m: 16,
            m0: 32,
            ef_construction: 100,
            ef_search: 100,
            seed: 0,
        }
    }
}

/// SA-Tree search configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaTreeConfig {
    /// Beam width for `beamKnnSearch`/`beamKnnSearch2`.
    pub beam_width: usize,
    /// Number of independent restarts for `greedyKnnSearch`.
    pub greedy_restarts: usize,
}

impl Default for SaTreeConfig {
    fn default() -> Self {
        Self {
            beam_width: 16,
            greedy_restarts: 4,
        }
    }
}

/// SWNG build/search configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwngConfig {
    /// Search fanout during build (`f`).
    pub fanout: usize,
    /// Target out-degree (`w`).
    pub out_degree: usize,
    /// RNG seed for restart selection.
    pub seed: u64,
}

impl Default for SwngConfig {
    fn default() -> Self {
        Self {
            fanout: 16,
            out_degree: 8,
            seed: 0,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Top-level configuration aggregating all engine and ambient sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// HNSW section.
    pub hnsw: HnswConfig,
    /// SA-Tree section.
    pub sa_tree: SaTreeConfig,
    /// SWNG section.
    pub swng: SwngConfig,
    /// Logging section.
    pub logging: LoggingConfig,
}

impl IndexConfig {
    /// Loads configuration from `vector-index.toml` in the current
    /// directory if present, layered over defaults and environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file or environment override fails to
    /// parse.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("vector-index.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the layered sources fail to parse.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("VECTOR_INDEX_").split("_"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string, useful in tests.
    ///
    /// # Errors
    ///
    /// Returns an error if `toml_str` fails to parse.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates every section against the parameter bounds in §4.2–§4.4.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hnsw.m == 0 {
            return Err(ConfigError::InvalidValue {
                key: "hnsw.m".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.hnsw.m0 == 0 {
            return Err(ConfigError::InvalidValue {
                key: "hnsw.m0".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.hnsw.ef_construction == 0 {
            return Err(ConfigError::InvalidValue {
                key: "hnsw.ef_construction".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.hnsw.ef_search == 0 {
            return Err(ConfigError::InvalidValue {
                key: "hnsw.ef_search".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        if self.swng.out_degree == 0 {
            return Err(ConfigError::InvalidValue {
                key: "swng.out_degree".to_string(),
                message: "must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}
