//! Bot API wire types. Only the fields the agent reads are modeled.

use crate::{TelegramError, TelegramResult};
use serde::Deserialize;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope, turning `ok: false` into an API error.
    pub fn into_result(self, http_status: u16) -> TelegramResult<T> {
        if !self.ok {
            return Err(TelegramError::Api {
                status: self.error_code.unwrap_or(http_status),
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        self.result.ok_or_else(|| TelegramError::Api {
            status: http_status,
            description: "response missing result".to_string(),
        })
    }
}

/// One entry of `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The bot account, as returned by `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}
