//! Configuration data types.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::validation;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Only allow `match` and `filter` at the top level of a fragment
    pub strict: bool,

    /// Plugin types users may write (empty = all types allowed)
    pub allowed_types: Vec<String>,

    /// Expand `$labels(...)` selectors
    pub label_macros: bool,

    /// Resolve `$from(...)` shared-log selectors
    pub share_macros: bool,

    /// Rewrite `detect_exceptions` filters
    pub detect_exceptions: bool,

    /// Enable debug logging to file
    pub debug: bool,

    /// Path to log directory
    pub log_path: PathBuf,

    /// Days to keep rotated log files
    pub log_retention_days: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: false,
            allowed_types: Vec::new(),
            label_macros: true,
            share_macros: true,
            detect_exceptions: true,
            debug: false,
            log_path: default_log_path(),
            log_retention_days: 2,
        }
    }
}

impl Config {
    /// Validate configuration and return errors if invalid.
    /// Delegates to the comprehensive validation module.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

/// Get default log path (relative to config directory).
/// This returns a placeholder; the actual path is set by ConfigService based on config file location.
pub fn default_log_path() -> PathBuf {
    default_log_path_for_config_dir(None)
}

/// Get log path based on config directory.
pub fn default_log_path_for_config_dir(config_dir: Option<&Path>) -> PathBuf {
    config_dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("tagscope")
        })
        .join("logs")
}
