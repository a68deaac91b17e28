//! Configuration for the binaries
//!
//! Loaded from a YAML file when one is given, otherwise built-in defaults.
//! `KG_GRAPH_PATH` and `KG_LOG_LEVEL` override whatever the file says.
//! The library's query functions never read this; callers pass the
//! `queries` values explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_GRAPH_PATH: &str = "./data/knowledge_graph.json";
pub const GRAPH_PATH_ENV: &str = "KG_GRAPH_PATH";
pub const LOG_LEVEL_ENV: &str = "KG_LOG_LEVEL";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KgConfig {
    /// Graph document read and written by the CLI; `.gz` for gzip
    pub graph_path: PathBuf,

    /// Indent the saved document
    pub pretty: bool,

    pub log_level: String,

    pub queries: QueryDefaults,
}

impl Default for KgConfig {
    fn default() -> Self {
        Self {
            graph_path: PathBuf::from(DEFAULT_GRAPH_PATH),
            pretty: true,
            log_level: "info".to_string(),
            queries: QueryDefaults::default(),
        }
    }
}

/// Values used by the CLI when a query flag is omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub similarity_threshold: f64,
    pub min_products: usize,
    pub popular_limit: usize,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.3,
            min_products: 2,
            popular_limit: 10,
        }
    }
}

impl KgConfig {
    /// Load from `path` if given, else defaults; environment overrides apply
    /// either way.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file without applying environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        let config: KgConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(GRAPH_PATH_ENV).filter(|p| !p.is_empty()) {
            self.graph_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let threshold = self.queries.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.queries.min_products == 0 {
            return Err(ConfigError::Invalid("min_products must be at least 1".to_string()));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }

    /// Default config rendered as YAML
    pub fn default_config_string() -> String {
        serde_yaml::to_string(&KgConfig::default()).unwrap_or_default()
    }
}
