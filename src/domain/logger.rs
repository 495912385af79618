//! Logging system with daily rotation.

use anyhow::Result;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use time::macros::format_description;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Prefix of every log file written by tagscope.
const LOG_FILE_PREFIX: &str = "tagscope";

/// Initialize the logging system.
///
/// Output goes to a daily-rotated file under `config.log_path`; stdout is left
/// to the rendered configuration. `RUST_LOG` refines the default debug level.
pub fn init(config: &Config) -> Result<()> {
    if !config.log_path.exists() {
        fs::create_dir_all(&config.log_path)?;
    }

    cleanup_old_logs(&config.log_path, config.log_retention_days)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_path, LOG_FILE_PREFIX);

    // Use local timezone for timestamps
    let time_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = OffsetTime::new(local_offset, time_format);

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(timer),
        );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

/// Remove tagscope log files not modified within `retention_days`.
pub fn cleanup_old_logs(log_path: &Path, retention_days: u64) -> Result<()> {
    if !log_path.exists() {
        return Ok(());
    }

    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let cutoff = match SystemTime::now().checked_sub(retention) {
        Some(cutoff) => cutoff,
        None => return Ok(()),
    };

    for entry in fs::read_dir(log_path)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let is_ours = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if !is_ours {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        if matches!(modified, Ok(m) if m < cutoff) {
            let _ = fs::remove_file(&path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("tagscope-logger-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_cleanup_keeps_recent_and_foreign_files() {
        let dir = temp_dir("keep");
        fs::write(dir.join("tagscope.2026-01-01"), "x").unwrap();
        fs::write(dir.join("other.log"), "x").unwrap();

        cleanup_old_logs(&dir, 2).unwrap();

        assert!(dir.join("tagscope.2026-01-01").exists());
        assert!(dir.join("other.log").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cleanup_with_zero_retention_removes_own_files() {
        let dir = temp_dir("zero");
        fs::write(dir.join("tagscope.2026-01-01"), "x").unwrap();
        fs::write(dir.join("other.log"), "x").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        cleanup_old_logs(&dir, 0).unwrap();

        assert!(!dir.join("tagscope.2026-01-01").exists());
        assert!(dir.join("other.log").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_cleanup_missing_dir_is_ok() {
        let dir = std::env::temp_dir().join("tagscope-logger-does-not-exist");
        assert!(cleanup_old_logs(&dir, 2).is_ok());
    }
}
