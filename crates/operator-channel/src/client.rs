//! Telegram Bot API client.

use crate::api::{ApiResponse, Message, Update, User};
use crate::{TelegramError, TelegramResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use session_supervisor::{OperatorChannel, OperatorError};
use std::borrow::Cow;
use std::time::Duration;
use tracing::debug;

/// Bot API limit for `sendMessage` text.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Bot API limit for media captions.
pub const MAX_CAPTION_CHARS: usize = 1024;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Thin client over the Bot API methods the agent uses.
#[derive(Clone)]
pub struct TelegramClient {
    http_client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_base` - Bot API base URL (e.g., `https://api.telegram.org`)
    /// * `token` - Bot token as issued by BotFather
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> TelegramResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TelegramError::Config("bot token is empty".to_string()));
        }

        Ok(Self {
            http_client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build the URL for a Bot API method.
    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Fetch the bot account. Used to check the token before anything else runs.
    pub async fn get_me(&self) -> TelegramResult<User> {
        let response = self
            .http_client
            .post(self.method_url("getMe"))
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        read_response(response).await
    }

    /// Send a plain text message.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> TelegramResult<Message> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": truncate_chars(text, MAX_MESSAGE_CHARS),
        });

        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .timeout(SEND_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        read_response(response).await
    }

    /// Upload an image with a caption.
    pub async fn send_photo(
        &self,
        chat_id: i64,
        image: Vec<u8>,
        caption: &str,
    ) -> TelegramResult<Message> {
        let photo = Part::bytes(image)
            .file_name("pairing.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", truncate_chars(caption, MAX_CAPTION_CHARS).into_owned())
            .part("photo", photo);

        let response = self
            .http_client
            .post(self.method_url("sendPhoto"))
            .timeout(SEND_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        read_response(response).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> TelegramResult<Vec<Update>> {
        let mut body = serde_json::json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }

        let response = self
            .http_client
            .post(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + LONG_POLL_GRACE)
            .json(&body)
            .send()
            .await?;

        read_response(response).await
    }
}

async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> TelegramResult<T> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
    envelope.into_result(status)
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> Cow<'_, str> {
    if text.chars().count() <= max {
        return Cow::Borrowed(text);
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    Cow::Owned(cut)
}

/// The operator channel: one Telegram chat.
#[derive(Clone)]
pub struct TelegramOperator {
    client: TelegramClient,
    chat_id: i64,
}

impl TelegramOperator {
    pub fn new(client: TelegramClient, chat_id: i64) -> Self {
        Self { client, chat_id }
    }
}

#[async_trait]
impl OperatorChannel for TelegramOperator {
    async fn notify(&self, text: &str) -> Result<(), OperatorError> {
        let message = self.client.send_message(self.chat_id, text).await?;
        debug!(message_id = message.message_id, "Operator notified");
        Ok(())
    }

    async fn send_image(&self, image: &[u8], caption: &str) -> Result<(), OperatorError> {
        let message = self
            .client
            .send_photo(self.chat_id, image.to_vec(), caption)
            .await?;
        debug!(message_id = message.message_id, "Image sent to operator");
        Ok(())
    }
}
