//! Inbound operator messages via `getUpdates` long polling.

use crate::api::Update;
use crate::{TelegramClient, TelegramResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(60);
const BACKOFF_CAP_EXPONENT: u32 = 6;

/// Texts from the operator chat, and the offset that acknowledges the batch.
pub fn operator_texts(updates: &[Update], chat_id: i64) -> (Option<i64>, Vec<String>) {
    let next_offset = updates.iter().map(|update| update.update_id + 1).max();

    let texts = updates
        .iter()
        .filter_map(|update| update.message.as_ref())
        .filter(|message| {
            let authorized = message.chat.id == chat_id;
            if !authorized {
                debug!(chat_id = message.chat.id, "Dropping message from unauthorized chat");
            }
            authorized
        })
        .filter_map(|message| message.text.clone())
        .collect();

    (next_offset, texts)
}

/// Poll the operator chat forever, handing each text to `forward`.
///
/// Updates queued before the call are acknowledged and skipped, so a
/// `/restart` that killed the previous process is not replayed. Returns
/// `Ok(())` once `forward` returns `false`, and an error only when the bot
/// token is rejected.
pub async fn poll_operator_messages<F>(
    client: TelegramClient,
    chat_id: i64,
    poll_timeout_secs: u64,
    mut forward: F,
) -> TelegramResult<()>
where
    F: FnMut(String) -> bool + Send,
{
    let mut offset = skip_backlog(&client).await?;
    let mut backoff = PollBackoff::default();

    info!(chat_id, "Listening for operator messages");

    loop {
        match client.get_updates(offset, poll_timeout_secs).await {
            Ok(updates) => {
                if backoff.failures > 0 {
                    info!(
                        previous_failures = backoff.failures,
                        "Operator poller recovered"
                    );
                }
                backoff.reset();

                let (next_offset, texts) = operator_texts(&updates, chat_id);
                if next_offset.is_some() {
                    offset = next_offset;
                }
                for text in texts {
                    if !forward(text) {
                        info!("Operator message sink closed; stopping poller");
                        return Ok(());
                    }
                }
            }
            Err(e) if e.is_rejected_token() => return Err(e),
            Err(e) => {
                let delay = backoff.next_delay();
                warn!(
                    error = %e,
                    failure_count = backoff.failures,
                    next_poll_ms = delay.as_millis(),
                    "Polling operator messages failed; backing off"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Acknowledge everything already queued and return the offset after it.
async fn skip_backlog(client: &TelegramClient) -> TelegramResult<Option<i64>> {
    drain_backlog(|offset| client.get_updates(offset, 0)).await
}

/// Fetch and acknowledge batches until one comes back empty.
///
/// `getUpdates` returns at most 100 updates per call.
async fn drain_backlog<F, Fut>(mut fetch: F) -> TelegramResult<Option<i64>>
where
    F: FnMut(Option<i64>) -> Fut,
    Fut: Future<Output = TelegramResult<Vec<Update>>>,
{
    let mut offset = None;
    let mut skipped = 0usize;

    loop {
        match fetch(offset).await {
            Ok(updates) if updates.is_empty() => break,
            Ok(updates) => {
                skipped += updates.len();
                offset = updates
                    .iter()
                    .map(|update| update.update_id + 1)
                    .max()
                    .or(offset);
            }
            Err(e) if e.is_rejected_token() => return Err(e),
            Err(e) => {
                warn!(error = %e, skipped, "Could not skip queued operator updates");
                break;
            }
        }
    }

    if skipped > 0 {
        info!(skipped, "Skipped queued operator updates");
    }
    Ok(offset)
}

#[derive(Debug, Default)]
struct PollBackoff {
    failures: u32,
}

impl PollBackoff {
    fn reset(&mut self) {
        self.failures = 0;
    }

    fn next_delay(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let shift = self.failures.min(BACKOFF_CAP_EXPONENT);
        let delay = BACKOFF_BASE.saturating_mul(1u32 << shift);
        delay.min(BACKOFF_MAX)
    }
}
