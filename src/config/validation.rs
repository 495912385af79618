//! Configuration validation.

use anyhow::{bail, Result};
use regex::Regex;

use super::Config;

/// Plugin type names as fluentd registers them.
const PLUGIN_TYPE_PATTERN: &str = r"^[a-z0-9][a-z0-9_-]*$";

/// RFC 1123 label, the syntax of a Kubernetes namespace name.
const NAMESPACE_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$";

/// Validate configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Validate log path
    if config.log_path.to_string_lossy().contains('\0') {
        bail!("Invalid log_path: contains null character");
    }

    // Validate allowed plugin types
    let type_re = Regex::new(PLUGIN_TYPE_PATTERN)?;
    for (i, kind) in config.allowed_types.iter().enumerate() {
        if kind.is_empty() {
            bail!("allowed_types[{}]: type cannot be empty", i);
        }
        if !type_re.is_match(kind) {
            bail!("allowed_types[{}]: invalid plugin type '{}'", i, kind);
        }
    }

    if config.log_retention_days == 0 {
        bail!("log_retention_days must be at least 1");
    }

    Ok(())
}

/// Validate a namespace name given on the command line.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if !Regex::new(NAMESPACE_PATTERN)?.is_match(namespace) {
        bail!("Invalid namespace '{}': must be a lowercase RFC 1123 label", namespace);
    }
    Ok(())
}
