//! Telegram operator channel.
//!
//! Outbound: text notifications and the pairing image, sent to one
//! configured chat. Inbound: long-polled updates from that same chat,
//! forwarded as raw text. Messages from any other chat are dropped.

mod api;
mod client;
mod error;
mod poller;

pub use api::{Chat, Message, Update, User};
pub use client::{TelegramClient, TelegramOperator, MAX_CAPTION_CHARS, MAX_MESSAGE_CHARS};
pub use error::{TelegramError, TelegramResult};
pub use poller::{operator_texts, poll_operator_messages};
