//! Core configuration, paths and logging setup for session-warden.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_CONFIRM_TOKEN, DEFAULT_LOG_LEVEL, DEFAULT_RESTART_COMMAND,
    DEFAULT_TELEGRAM_API_BASE,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
