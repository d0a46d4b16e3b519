//! Error types for the Telegram operator channel.

use session_supervisor::OperatorError;
use thiserror::Error;

/// Errors from the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Network or transport-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered `ok: false`.
    #[error("Telegram API error: {status} - {description}")]
    Api { status: u16, description: String },

    /// The response body did not match the expected schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid token, chat id or base URL.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using TelegramError.
pub type TelegramResult<T> = Result<T, TelegramError>;

impl TelegramError {
    /// The Bot API refused the token. Retrying will not help.
    pub fn is_rejected_token(&self) -> bool {
        matches!(self, TelegramError::Api { status: 401 | 404, .. })
    }
}

impl From<TelegramError> for OperatorError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Http(e) => OperatorError::Request(e.to_string()),
            TelegramError::Api {
                status,
                description,
            } => OperatorError::Api {
                status,
                description,
            },
            TelegramError::Json(e) => OperatorError::InvalidResponse(e.to_string()),
            TelegramError::Config(message) => OperatorError::Request(message),
        }
    }
}
