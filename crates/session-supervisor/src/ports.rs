//! Collaborator ports.
//!
//! The supervisor only sees these traits; adapters for the transport
//! sidecar, the credentials directory, Telegram and the process manager
//! implement them in their own crates.

use crate::{CredentialError, OperatorError, RestartError, TransportError};
use async_trait::async_trait;
use std::sync::Arc;

/// The messaging transport. Events arrive separately as `ConnectionEvent`s.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start (or restart) the session. Returns once the transport accepted the request.
    async fn connect(&self) -> Result<(), TransportError>;

    /// End the session on the remote side.
    async fn logout(&self) -> Result<(), TransportError>;
}

/// Durable session credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Whether credentials are persisted.
    async fn exists(&self) -> bool;

    /// Irreversibly delete persisted credentials. Wiping nothing succeeds.
    async fn wipe(&self) -> Result<(), CredentialError>;
}

/// Outbound side of the operator channel.
#[async_trait]
pub trait OperatorChannel: Send + Sync {
    /// Send a text notification.
    async fn notify(&self, text: &str) -> Result<(), OperatorError>;

    /// Send an image with a caption.
    async fn send_image(&self, image: &[u8], caption: &str) -> Result<(), OperatorError>;
}

/// Restarts the whole agent process.
#[async_trait]
pub trait ProcessController: Send + Sync {
    async fn restart(&self) -> Result<(), RestartError>;
}

/// Collaborator handles injected into the supervisor.
#[derive(Clone)]
pub struct Ports {
    pub transport: Arc<dyn Transport>,
    pub credentials: Arc<dyn CredentialStore>,
    pub operator: Arc<dyn OperatorChannel>,
    pub process: Arc<dyn ProcessController>,
}
