//! Logging initialization for the agent.
//!
//! Delegates to the observability package, which writes structured JSONL to
//! the central log file and mirrors events to stderr.

use std::path::PathBuf;

const SERVICE_NAME: &str = "session-warden";

/// Initialize the logging system.
///
/// * `level` - Default log level, overridden by `RUST_LOG` when set
/// * `log_path` - Central JSONL file; `None` uses the observability default
pub fn init_logging(level: &str, log_path: Option<PathBuf>) {
    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path,
        also_stderr: true,
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
