//! Error types for the transport bridge.

use session_supervisor::TransportError;
use thiserror::Error;

/// Errors from the sidecar connection.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Could not reach the sidecar socket.
    #[error("Sidecar connection error: {0}")]
    Connection(String),

    /// IO error on an established connection.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line was not valid protocol JSON.
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// A pairing payload was not valid base64.
    #[error("Invalid pairing payload: {0}")]
    Payload(#[from] base64::DecodeError),
}

/// Result type alias using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl From<BridgeError> for TransportError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Connection(message) => TransportError::Unavailable(message),
            BridgeError::Io(e) => TransportError::Io(e),
            other => TransportError::Rejected(other.to_string()),
        }
    }
}
