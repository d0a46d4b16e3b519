//! Session Supervisor for the messaging agent.
//!
//! Owns the lifecycle of the single transport session: when to reconnect on
//! its own, when to wipe credentials and wait for the operator to re-pair,
//! and when a fault is bad enough to restart the whole process.
//!
//! All inputs (transport events, operator text, process faults and the
//! completion of connect attempts) are serialized through one queue drained
//! by a single task, see [`spawn_supervisor`].
//!
//! Collaborators are injected as trait objects through [`Ports`]; the
//! concrete adapters live in their own crates.

mod classifier;
mod commands;
mod error;
mod guard;
mod ports;
mod runtime;
mod state;
mod supervisor;

#[cfg(test)]
mod tests;

pub use classifier::{classify, classify_message, matched_keyword, FaultClass, CRITICAL_KEYWORDS};
pub use commands::OperatorCommand;
pub use error::{
    CredentialError, OperatorError, RestartError, SupervisorError, SupervisorResult,
    TransportError,
};
pub use guard::{ReconnectGuard, ReconnectPermit};
pub use ports::{CredentialStore, OperatorChannel, Ports, ProcessController, Transport};
pub use runtime::{spawn_supervisor, SupervisorHandle};
pub use state::{
    ConnectOrigin, ConnectionEvent, Fault, FaultSource, SessionState, SupervisorInput,
    SupervisorSnapshot,
};
pub use supervisor::SupervisorSettings;
