//! Configuration service for loading and generating config files.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::default_log_path_for_config_dir;
use super::Config;

/// Configuration service.
pub struct ConfigService;

impl ConfigService {
    /// Get the default configuration file path.
    /// Always uses ~/.config/tagscope/config.toml for cross-platform consistency.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("tagscope")
            .join("config.toml")
    }

    /// Load configuration from file.
    ///
    /// If `path` is `None`, uses the default path.
    /// If the file doesn't exist, creates default configuration file.
    /// Log path defaults to the same directory as config file.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = path.map(PathBuf::from).unwrap_or_else(Self::default_path);
        let config_dir = path.parent();

        if !path.exists() {
            Self::generate_at(&path)?;
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // An unset log_path still holds the general default
        if config.log_path == default_log_path_for_config_dir(None) {
            config.log_path = default_log_path_for_config_dir(config_dir);
        }

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config)
    }

    /// Generate default configuration file at the specified path.
    pub fn generate_at(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Generate default configuration content with comments.
    fn default_config_content() -> &'static str {
        r#"# tagscope configuration file

# Only allow <match> and <filter> at the top level of a namespace fragment (default: false)
# --strict on the command line turns this on for a single run
strict = false

# Plugin types a namespace fragment may use (default: empty = no restriction)
# Directives generated by tagscope itself are not checked
# allowed_types = ["null", "stdout", "grep", "record_transformer", "detect_exceptions", "rewrite_tag_filter"]

# Expand $labels(app=foo,tier=web) selectors (default: true)
label_macros = true

# Resolve $from(other-namespace) shared-log selectors (default: true)
share_macros = true

# Rewrite detect_exceptions filters into routing directives (default: true)
detect_exceptions = true

# Enable debug logging to file (default: false)
debug = false

# Path to log directory (default: same directory as config.toml/logs)
# If --config is specified, logs go to that directory/logs
# log_path = "~/.config/tagscope/logs"

# Days to keep rotated log files (default: 2)
log_retention_days = 2
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tagscope-config-{}-{}", name, std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config: Config = toml::from_str(ConfigService::default_config_content()).unwrap();
        let defaults = Config::default();
        assert_eq!(config.strict, defaults.strict);
        assert_eq!(config.allowed_types, defaults.allowed_types);
        assert_eq!(config.detect_exceptions, defaults.detect_exceptions);
        assert_eq!(config.log_retention_days, defaults.log_retention_days);
    }

    #[test]
    fn test_load_generates_missing_file() {
        let path = temp_config("generate");
        let dir = path.parent().unwrap().to_path_buf();
        fs::remove_dir_all(&dir).ok();

        let config = ConfigService::load(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.log_path, dir.join("logs"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let path = temp_config("invalid");
        let dir = path.parent().unwrap().to_path_buf();
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, "allowed_types = [\"Not Valid\"]\n").unwrap();

        let err = ConfigService::load(Some(&path)).unwrap_err();

        assert!(format!("{:#}", err).contains("invalid plugin type"));
        fs::remove_dir_all(&dir).ok();
    }
}
