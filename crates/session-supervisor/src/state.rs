//! Session state and the inputs the supervisor consumes.

use crate::guard::ReconnectPermit;
use crate::TransportError;
use std::fmt;
use tokio::sync::oneshot;

/// Lifecycle state of the transport session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Nothing attempted yet.
    #[default]
    Idle,
    /// A connect call has been issued and no outcome is known yet.
    Connecting,
    /// The transport produced a pairing payload; waiting for the operator to scan it.
    AwaitingPairing,
    /// The session is live.
    Open,
    /// Automatic recovery is exhausted; waiting for the operator's confirm token.
    AwaitingOperatorConfirm,
}

impl SessionState {
    /// Whether a session exists that `/logout` can end.
    pub fn has_active_session(&self) -> bool {
        matches!(
            self,
            SessionState::Open | SessionState::Connecting | SessionState::AwaitingPairing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::AwaitingPairing => "awaiting_pairing",
            SessionState::Open => "open",
            SessionState::AwaitingOperatorConfirm => "awaiting_operator_confirm",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events produced by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The transport needs a fresh sign-in. `payload` is the rendered pairing image.
    Pairing { payload: Vec<u8> },
    /// The session is live.
    Opened,
    /// The connection closed. `logged_out` means the remote invalidated the credentials.
    Closed {
        logged_out: bool,
        status_code: Option<u16>,
        message: String,
    },
}

impl ConnectionEvent {
    /// A recoverable disconnect with the given reason.
    pub fn closed(message: impl Into<String>) -> Self {
        ConnectionEvent::Closed {
            logged_out: false,
            status_code: None,
            message: message.into(),
        }
    }

    /// A disconnect caused by the remote logging the session out.
    pub fn logged_out(status_code: Option<u16>, message: impl Into<String>) -> Self {
        ConnectionEvent::Closed {
            logged_out: true,
            status_code,
            message: message.into(),
        }
    }
}

/// Where a process fault was caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSource {
    /// A panic that reached the panic hook.
    UncaughtFault,
    /// A background task that failed with nobody awaiting it.
    UnhandledAsync,
}

impl FaultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultSource::UncaughtFault => "uncaught_fault",
            FaultSource::UnhandledAsync => "unhandled_async",
        }
    }
}

/// A process-level fault reported to the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub message: String,
    pub source: FaultSource,
}

impl Fault {
    pub fn new(message: impl Into<String>, source: FaultSource) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}

/// Who asked for a connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOrigin {
    /// The first connect after the supervisor starts.
    Startup,
    /// The single automatic reconnect after a recoverable disconnect.
    Automatic,
    /// The operator replied with the confirm token.
    Operator,
}

impl ConnectOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectOrigin::Startup => "startup",
            ConnectOrigin::Automatic => "automatic",
            ConnectOrigin::Operator => "operator",
        }
    }
}

/// Point-in-time view of the supervisor, answered in queue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSnapshot {
    pub state: SessionState,
    pub reconnect_guard_held: bool,
    pub pending_confirmation: bool,
    pub escalated: bool,
}

/// Everything the supervisor task consumes, in arrival order.
#[derive(Debug)]
pub enum SupervisorInput {
    /// Issue the initial connect if nothing has happened yet.
    Start,
    /// An event from the transport.
    Connection(ConnectionEvent),
    /// Raw text from the operator chat.
    Operator(String),
    /// A process fault.
    Fault(Fault),
    /// A connect call issued by the supervisor finished.
    ///
    /// Automatic attempts carry their guard permit so it is released only
    /// once the outcome has been handled.
    ConnectFinished {
        origin: ConnectOrigin,
        permit: Option<ReconnectPermit>,
        result: Result<(), TransportError>,
    },
    /// Report the current state.
    Snapshot(oneshot::Sender<SupervisorSnapshot>),
}
