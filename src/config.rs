//! Configuration for the version stamp generator

use crate::clock::TimeBasis;
use crate::types::DEFAULT_OUTPUT_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "version_stamp.toml";

/// Generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Where the stamp is written. The parent directory must already exist.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Zone used for `buildDate` / `buildTime`
    #[serde(default)]
    pub time_basis: TimeBasis,

    /// Take the build time from `SOURCE_DATE_EPOCH` when it is set
    #[serde(default)]
    pub reproducible: bool,

    /// Log level filter string. Overridden by RUST_LOG.
    /// Default: "version_stamp=info"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions for serde
fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}

fn default_log_level() -> String {
    "version_stamp=info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            time_basis: TimeBasis::default(),
            reproducible: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Apply `STAMP_*` variables from `lookup` on top of the defaults.
    /// Values that fail to parse are ignored.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("STAMP_OUTPUT") {
            if !path.trim().is_empty() {
                config.output_path = PathBuf::from(path);
            }
        }

        if let Some(basis) = lookup("STAMP_TIME_BASIS") {
            if let Ok(parsed) = basis.parse() {
                config.time_basis = parsed;
            }
        }

        if let Some(flag) = lookup("STAMP_REPRODUCIBLE") {
            config.reproducible = flag == "true" || flag == "1";
        }

        if let Some(level) = lookup("STAMP_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Load configuration from `STAMP_CONFIG` or `version_stamp.toml`,
    /// otherwise from environment.
    ///
    /// A config file that is named or present must read and parse; the
    /// environment is only consulted when there is no file at all.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("STAMP_CONFIG") {
            return Self::from_file(&path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::from_env())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
