//! Supervisor task and its handle.

use crate::ports::Ports;
use crate::state::{ConnectionEvent, Fault, SupervisorInput, SupervisorSnapshot};
use crate::supervisor::{Supervisor, SupervisorSettings};
use crate::{SupervisorError, SupervisorResult};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn the supervisor task.
///
/// The task drains its queue strictly in arrival order and stops once every
/// [`SupervisorHandle`] has been dropped and in-flight connects have reported.
pub fn spawn_supervisor(
    ports: Ports,
    settings: SupervisorSettings,
) -> (SupervisorHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut supervisor = Supervisor::new(ports, settings, tx.downgrade());

    let task = tokio::spawn(async move {
        info!("Session supervisor started");
        while let Some(input) = rx.recv().await {
            supervisor.handle(input).await;
        }
        debug!("Session supervisor stopped");
    });

    (SupervisorHandle { tx }, task)
}

/// Cloneable entry point into the supervisor queue.
#[derive(Clone)]
pub struct SupervisorHandle {
    tx: mpsc::UnboundedSender<SupervisorInput>,
}

impl SupervisorHandle {
    /// Issue the initial connect. Ignored unless the session is still idle.
    pub fn start(&self) -> SupervisorResult<()> {
        self.send(SupervisorInput::Start)
    }

    pub fn connection_event(&self, event: ConnectionEvent) -> SupervisorResult<()> {
        self.send(SupervisorInput::Connection(event))
    }

    pub fn operator_text(&self, text: impl Into<String>) -> SupervisorResult<()> {
        self.send(SupervisorInput::Operator(text.into()))
    }

    pub fn fault(&self, fault: Fault) -> SupervisorResult<()> {
        self.send(SupervisorInput::Fault(fault))
    }

    /// State after every input queued before this call has been handled.
    pub async fn snapshot(&self) -> SupervisorResult<SupervisorSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(SupervisorInput::Snapshot(reply_tx))?;
        reply_rx.await.map_err(|_| SupervisorError::SnapshotDropped)
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, input: SupervisorInput) -> SupervisorResult<()> {
        self.tx.send(input).map_err(|_| SupervisorError::NotRunning)
    }
}
