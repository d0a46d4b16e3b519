//! Error types for the supervisor and its collaborator ports.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by the transport port.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The transport sidecar is not reachable.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// The transport did not answer in time.
    #[error("Transport command timed out after {0:?}")]
    Timeout(Duration),

    /// The transport answered but refused the command.
    #[error("Transport rejected command: {0}")]
    Rejected(String),

    /// IO error talking to the transport.
    #[error("Transport IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the credential store port.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// IO error while touching persisted credentials.
    #[error("Credential store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Credentials live somewhere the store refuses to touch.
    #[error("Refusing to wipe credentials at {0}")]
    UnsafePath(String),
}

/// Errors returned by the operator channel port.
#[derive(Error, Debug)]
pub enum OperatorError {
    /// The request never reached the channel.
    #[error("Operator channel request failed: {0}")]
    Request(String),

    /// The channel answered with an error.
    #[error("Operator channel API error ({status}): {description}")]
    Api { status: u16, description: String },

    /// The channel answered with something unreadable.
    #[error("Invalid operator channel response: {0}")]
    InvalidResponse(String),
}

/// Errors returned by the process controller port.
#[derive(Error, Debug)]
pub enum RestartError {
    /// The restart command could not be spawned.
    #[error("Failed to spawn restart command: {0}")]
    Spawn(#[from] std::io::Error),

    /// The restart command exited unsuccessfully.
    #[error("Restart command failed (exit code {code:?}): {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    /// The restart command did not finish in time.
    #[error("Restart command timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors surfaced by the supervisor handle.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The supervisor task has stopped and no longer accepts input.
    #[error("Supervisor is not running")]
    NotRunning,

    /// The supervisor dropped a snapshot request without answering.
    #[error("Supervisor dropped the snapshot request")]
    SnapshotDropped,
}

/// Result type alias using SupervisorError.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
