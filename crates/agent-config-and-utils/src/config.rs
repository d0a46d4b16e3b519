//! Configuration management for the agent.

use crate::{CoreError, CoreResult, Paths};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default Telegram Bot API base URL.
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Default operator reply that confirms a re-pairing.
pub const DEFAULT_CONFIRM_TOKEN: &str = "si";

/// Default command used to restart the whole agent under its process manager.
pub const DEFAULT_RESTART_COMMAND: &str = "pm2 restart session-warden";

const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RESTART_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TRANSPORT_COMMAND_TIMEOUT_SECS: u64 = 30;

/// Main agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Telegram bot token for the operator channel.
    #[serde(default)]
    pub telegram_token: Option<String>,
    /// Telegram chat id of the operator. Messages from any other chat are ignored.
    #[serde(default)]
    pub telegram_chat_id: Option<i64>,
    /// Telegram Bot API base URL.
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,
    /// Long-poll timeout for `getUpdates`, in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub telegram_poll_timeout_secs: u64,
    /// Operator reply that confirms a re-pairing (compared trimmed, case-insensitive).
    #[serde(default = "default_confirm_token")]
    pub confirm_token: String,
    /// Shell command that restarts the agent under its process manager.
    #[serde(default = "default_restart_command")]
    pub restart_command: String,
    /// Timeout for the restart command, in seconds.
    #[serde(default = "default_restart_timeout_secs")]
    pub restart_timeout_secs: u64,
    /// Command reminder appended to the "connected" notification.
    #[serde(default)]
    pub main_command: Option<String>,
    /// Unix socket of the transport sidecar. Defaults to `<base_dir>/transport.sock`.
    #[serde(default)]
    pub transport_socket: Option<PathBuf>,
    /// Timeout for connect/logout commands sent to the transport sidecar, in seconds.
    #[serde(default = "default_transport_command_timeout_secs")]
    pub transport_command_timeout_secs: u64,
    /// Directory holding persisted session credentials. Defaults to `<base_dir>/credentials`.
    #[serde(default)]
    pub credentials_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_telegram_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}

fn default_poll_timeout_secs() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}

fn default_confirm_token() -> String {
    DEFAULT_CONFIRM_TOKEN.to_string()
}

fn default_restart_command() -> String {
    DEFAULT_RESTART_COMMAND.to_string()
}

fn default_restart_timeout_secs() -> u64 {
    DEFAULT_RESTART_TIMEOUT_SECS
}

fn default_transport_command_timeout_secs() -> u64 {
    DEFAULT_TRANSPORT_COMMAND_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            telegram_token: None,
            telegram_chat_id: None,
            telegram_api_base: default_telegram_api_base(),
            telegram_poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            confirm_token: default_confirm_token(),
            restart_command: default_restart_command(),
            restart_timeout_secs: DEFAULT_RESTART_TIMEOUT_SECS,
            main_command: None,
            transport_socket: None,
            transport_command_timeout_secs: DEFAULT_TRANSPORT_COMMAND_TIMEOUT_SECS,
            credentials_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from `<base_dir>/config.json`, falling back to
    /// defaults, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from environment-style variables.
    ///
    /// Takes a lookup function so tests never touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);

        if let Some(level) = get("WARDEN_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(token) = get("TELEGRAM_TOKEN") {
            self.telegram_token = Some(token);
        }
        if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
            match chat_id.parse::<i64>() {
                Ok(id) => self.telegram_chat_id = Some(id),
                Err(_) => tracing::warn!(value = %chat_id, "Ignoring non-numeric TELEGRAM_CHAT_ID"),
            }
        }
        if let Some(command) = get("WARDEN_RESTART_COMMAND") {
            self.restart_command = command;
        }
        if let Some(token) = get("WARDEN_CONFIRM_TOKEN") {
            self.confirm_token = token;
        }
        if let Some(command) = get("WARDEN_MAIN_COMMAND") {
            self.main_command = Some(command);
        }
        if let Some(socket) = get("WARDEN_TRANSPORT_SOCKET") {
            self.transport_socket = Some(PathBuf::from(socket));
        }
        if let Some(dir) = get("WARDEN_CREDENTIALS_DIR") {
            self.credentials_dir = Some(PathBuf::from(dir));
        }
    }

    /// Check that everything the agent needs at runtime is present.
    pub fn validate(&self) -> CoreResult<()> {
        if self.telegram_token.as_deref().map_or(true, str::is_empty) {
            return Err(CoreError::Config(
                "telegram_token is required (set TELEGRAM_TOKEN)".to_string(),
            ));
        }
        if self.telegram_chat_id.is_none() {
            return Err(CoreError::Config(
                "telegram_chat_id is required (set TELEGRAM_CHAT_ID)".to_string(),
            ));
        }
        if self.confirm_token.trim().is_empty() {
            return Err(CoreError::Config("confirm_token must not be blank".to_string()));
        }
        if self.restart_command.trim().is_empty() {
            return Err(CoreError::Config("restart_command must not be blank".to_string()));
        }
        self.telegram_api_base()?;
        Ok(())
    }

    /// Get the Telegram API base as a parsed URL.
    pub fn telegram_api_base(&self) -> CoreResult<Url> {
        Url::parse(&self.telegram_api_base).map_err(CoreError::from)
    }

    /// Resolved transport sidecar socket.
    pub fn transport_socket(&self, paths: &Paths) -> PathBuf {
        self.transport_socket
            .clone()
            .unwrap_or_else(|| paths.transport_socket_file())
    }

    /// Resolved credentials directory.
    pub fn credentials_dir(&self, paths: &Paths) -> PathBuf {
        self.credentials_dir
            .clone()
            .unwrap_or_else(|| paths.credentials_dir())
    }

    /// Telegram token with everything but the bot id masked, for logging.
    pub fn redacted_token(&self) -> String {
        match self.telegram_token.as_deref() {
            Some(token) => match token.split_once(':') {
                Some((bot_id, _)) => format!("{}:***", bot_id),
                None => "***".to_string(),
            },
            None => "<unset>".to_string(),
        }
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
