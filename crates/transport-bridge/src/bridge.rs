//! Sidecar connection: command writer plus event reader.

use crate::protocol::{decode_line, encode_line, AgentCommand, SidecarMessage};
use crate::{BridgeError, BridgeResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use session_supervisor::{ConnectionEvent, Transport, TransportError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reason attached to the `Closed` event emitted when the sidecar goes away.
pub const DISCONNECTED_MESSAGE: &str = "transport bridge disconnected";

type CommandReply = Result<(), String>;

/// Where readers of re-opened connections deliver events. Returns `false`
/// once nobody is listening.
pub type EventSink = Arc<dyn Fn(ConnectionEvent) -> bool + Send + Sync>;

struct Shared {
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    pending: Mutex<HashMap<Uuid, oneshot::Sender<CommandReply>>>,
    sink: Mutex<Option<EventSink>>,
}

impl Shared {
    fn resolve(&self, id: Uuid, reply: CommandReply) {
        match self.pending.lock().remove(&id) {
            Some(tx) => {
                let _ = tx.send(reply);
            }
            None => debug!(%id, "Result for unknown or expired command"),
        }
    }

    /// Fail every in-flight command; dropping the senders wakes the waiters.
    fn fail_all_pending(&self) {
        let pending: Vec<_> = self.pending.lock().drain().collect();
        if !pending.is_empty() {
            debug!(count = pending.len(), "Abandoning in-flight commands");
        }
    }
}

/// Command side of the bridge. Implements the supervisor's transport port.
#[derive(Clone)]
pub struct BridgeTransport {
    shared: Arc<Shared>,
    command_timeout: Duration,
}

impl BridgeTransport {
    /// Connect to the sidecar socket.
    ///
    /// Returns the command handle and the reader that must be driven for
    /// events and command results to arrive.
    pub async fn open(
        socket_path: &Path,
        command_timeout: Duration,
    ) -> BridgeResult<(Self, BridgeReader)> {
        let (read_half, write_half) = dial(socket_path).await?.into_split();
        let shared = Arc::new(Shared {
            socket_path: socket_path.to_path_buf(),
            writer: tokio::sync::Mutex::new(Some(write_half)),
            pending: Mutex::new(HashMap::new()),
            sink: Mutex::new(None),
        });

        let transport = Self {
            shared: Arc::clone(&shared),
            command_timeout,
        };
        let reader = BridgeReader {
            lines: BufReader::new(read_half).lines(),
            shared,
        };
        Ok((transport, reader))
    }

    /// Deliver events from re-opened connections to `sink`.
    ///
    /// The first connection's reader is driven by the caller of [`open`];
    /// after the sidecar goes away, the next command dials it again and
    /// spawns a reader that forwards here.
    ///
    /// [`open`]: BridgeTransport::open
    pub fn set_event_sink(&self, sink: EventSink) {
        *self.shared.sink.lock() = Some(sink);
    }

    /// Re-dial the sidecar if the previous connection was lost.
    async fn ensure_connected(&self) -> Result<(), TransportError> {
        let mut writer = self.shared.writer.lock().await;
        if writer.is_some() {
            return Ok(());
        }

        let (read_half, write_half) = dial(&self.shared.socket_path).await?.into_split();
        *writer = Some(write_half);
        info!(path = %self.shared.socket_path.display(), "Reconnected to transport sidecar");

        let reader = BridgeReader {
            lines: BufReader::new(read_half).lines(),
            shared: Arc::clone(&self.shared),
        };
        let sink = self.shared.sink.lock().clone();
        tokio::spawn(async move {
            let result = match sink {
                Some(sink) => reader.run(move |event| sink(event)).await,
                None => {
                    reader
                        .run(|event| {
                            debug!(?event, "No event sink; dropping sidecar event");
                            true
                        })
                        .await
                }
            };
            if let Err(e) = result {
                warn!(error = %e, "Transport bridge reader failed");
            }
        });
        Ok(())
    }

    /// Send one command and wait for its `command_result`.
    async fn send_command(&self, command: AgentCommand) -> Result<(), TransportError> {
        let id = command.id();
        let line = encode_line(&command)?;
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(id, tx);

        if let Err(e) = self.write_line(&line).await {
            self.shared.pending.lock().remove(&id);
            return Err(e);
        }
        debug!(%id, command = command.name(), "Sent command to sidecar");

        match timeout(self.command_timeout, rx).await {
            Err(_) => {
                self.shared.pending.lock().remove(&id);
                Err(TransportError::Timeout(self.command_timeout))
            }
            Ok(Err(_)) => Err(TransportError::Unavailable(DISCONNECTED_MESSAGE.to_string())),
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(reason))) => Err(TransportError::Rejected(reason)),
        }
    }

    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut writer = self.shared.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(TransportError::Unavailable(DISCONNECTED_MESSAGE.to_string()));
        };
        stream.write_all(line.as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.ensure_connected().await?;
        self.send_command(AgentCommand::Connect { id: Uuid::new_v4() })
            .await
    }

    async fn logout(&self) -> Result<(), TransportError> {
        self.ensure_connected().await?;
        self.send_command(AgentCommand::Logout { id: Uuid::new_v4() })
            .await
    }
}

/// Event side of the bridge.
pub struct BridgeReader {
    lines: Lines<BufReader<OwnedReadHalf>>,
    shared: Arc<Shared>,
}

impl BridgeReader {
    /// Read until the sidecar disconnects, handing each event to `forward`.
    ///
    /// On disconnect, every in-flight command fails, the next command
    /// re-dials the sidecar, and a recoverable `Closed` event is forwarded. Stops early if
    /// `forward` returns `false`.
    pub async fn run<F>(mut self, mut forward: F) -> BridgeResult<()>
    where
        F: FnMut(ConnectionEvent) -> bool + Send,
    {
        let result = loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break Ok(()),
                Err(e) => break Err(BridgeError::Io(e)),
            };
            if line.trim().is_empty() {
                continue;
            }

            let message = match decode_line(&line) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed sidecar line");
                    continue;
                }
            };

            if let SidecarMessage::CommandResult { id, ok, error } = &message {
                let reply = if *ok {
                    Ok(())
                } else {
                    Err(error.clone().unwrap_or_else(|| "command failed".to_string()))
                };
                self.shared.resolve(*id, reply);
                continue;
            }

            match message.into_event() {
                Ok(Some(event)) => {
                    if !forward(event) {
                        info!("Connection event sink closed; stopping bridge reader");
                        return Ok(());
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Skipping undecodable sidecar event"),
            }
        };

        warn!("Transport sidecar disconnected");
        {
            let mut writer = self.shared.writer.lock().await;
            writer.take();
            self.shared.fail_all_pending();
        }
        forward(ConnectionEvent::closed(DISCONNECTED_MESSAGE));
        result
    }
}

async fn dial(socket_path: &Path) -> BridgeResult<UnixStream> {
    let stream = UnixStream::connect(socket_path).await.map_err(|e| {
        BridgeError::Connection(format!(
            "Failed to connect to sidecar at {}: {}",
            socket_path.display(),
            e
        ))
    })?;
    debug!(path = %socket_path.display(), "Connected to transport sidecar");
    Ok(stream)
}

/// Connect to the sidecar, retrying while it starts up.
pub async fn connect_with_retry(
    socket_path: &Path,
    command_timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
) -> BridgeResult<(BridgeTransport, BridgeReader)> {
    let mut attempt = 1;
    loop {
        match BridgeTransport::open(socket_path, command_timeout).await {
            Ok(bridge) => return Ok(bridge),
            Err(e) if attempt < max_retries => {
                warn!(
                    attempt,
                    max_retries,
                    error = %e,
                    "Failed to connect to transport sidecar, retrying..."
                );
                tokio::time::sleep(retry_delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
