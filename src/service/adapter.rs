//! Format adapters for directive fragments.
//!
//! This module provides input parsing and output formatting for:
//! - fluentd configuration text (default)
//! - JSON arrays of directives

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::cli::Format;
use crate::domain::{ConfigParser, Fragment};

/// Adapter for converting between format-specific I/O and fragments.
pub struct FormatAdapter {
    format: Format,
}

impl FormatAdapter {
    /// Create a new adapter for the specified format.
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    /// Parse input string to a Fragment based on format.
    pub fn parse_input(&self, input: &str) -> Result<Fragment> {
        let fragment = match self.format {
            Format::Text => ConfigParser::new()?.parse(input)?,
            Format::Json => serde_json::from_str(input)
                .map_err(|e| anyhow!("Failed to parse JSON fragment: {}", e))?,
        };
        debug!(format = ?self.format, directives = fragment.len(), "Parsed fragment");
        Ok(fragment)
    }

    /// Format a fragment based on format.
    pub fn format_output(&self, fragment: &Fragment) -> Result<String> {
        match self.format {
            Format::Text => Ok(fragment.to_string()),
            Format::Json => serde_json::to_string_pretty(fragment)
                .map_err(|e| anyhow!("Failed to serialize fragment: {}", e)),
        }
    }
}
