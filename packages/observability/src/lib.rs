//! # Observability
//!
//! Centralized tracing setup for session-warden services.
//!
//! Services call [`init_with_config`] once at startup and use standard
//! `tracing` macros everywhere else. Every event is written as one JSON line
//! to a central file (`~/.session-warden/logs/warden.jsonl` by default):
//!
//! - `tail -f ~/.session-warden/logs/warden.jsonl | jq` for pretty output
//! - `lnav ~/.session-warden/logs/warden.jsonl` for interactive exploration
//!
//! An optional compact stderr layer gives immediate feedback when the agent
//! runs in the foreground under a process manager.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "session-warden".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! ```

mod json_layer;
mod writer;

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{CentralLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.session-warden/logs/warden.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with custom configuration.
///
/// Falls back to stderr-only logging when the central log file cannot be
/// opened.
pub fn init_with_config(config: LogConfig) {
    let log_path = config.log_path.clone().unwrap_or_else(default_log_path);

    let stderr_layer = if config.also_stderr {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_filter(env_filter(&config.default_level)),
        )
    } else {
        None
    };

    match CentralLogWriter::new(&log_path) {
        Ok(writer) => {
            let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer));

            let installed = tracing_subscriber::registry()
                .with(json_layer.with_filter(env_filter(&config.default_level)))
                .with(stderr_layer)
                .try_init();

            if installed.is_ok() {
                tracing::info!(
                    log_path = %log_path.display(),
                    service = %config.service_name,
                    "observability initialized"
                );
            }
        }
        Err(e) => {
            let installed = tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter(&config.default_level)))
                .try_init();

            if installed.is_ok() {
                tracing::warn!(
                    log_path = %log_path.display(),
                    error = %e,
                    "central log file unavailable, logging to stderr only"
                );
            }
        }
    }
}

/// Central log file location.
fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".session-warden")
        .join("logs")
        .join("warden.jsonl")
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_default_log_path_is_jsonl() {
        let path = default_log_path();
        assert_eq!(path.file_name().unwrap(), "warden.jsonl");
        assert!(path.parent().unwrap().ends_with("logs"));
    }
}
