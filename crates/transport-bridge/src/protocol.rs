//! Newline-delimited JSON protocol spoken with the sidecar.
//!
//! Sidecar to agent:
//! - `{"type":"pairing","payload":"<base64 image>"}`
//! - `{"type":"opened"}`
//! - `{"type":"closed","logged_out":false,"status_code":428,"message":"..."}`
//! - `{"type":"command_result","id":"<uuid>","ok":true}`
//!
//! Agent to sidecar:
//! - `{"type":"connect","id":"<uuid>"}`
//! - `{"type":"logout","id":"<uuid>"}`

use crate::BridgeResult;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use session_supervisor::ConnectionEvent;
use uuid::Uuid;

/// A line sent by the sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SidecarMessage {
    Pairing {
        payload: String,
    },
    Opened,
    Closed {
        #[serde(default)]
        logged_out: bool,
        #[serde(default)]
        status_code: Option<u16>,
        #[serde(default)]
        message: String,
    },
    CommandResult {
        id: Uuid,
        ok: bool,
        #[serde(default)]
        error: Option<String>,
    },
}

impl SidecarMessage {
    /// The connection event this line carries, if any.
    pub fn into_event(self) -> BridgeResult<Option<ConnectionEvent>> {
        let event = match self {
            SidecarMessage::Pairing { payload } => Some(ConnectionEvent::Pairing {
                payload: STANDARD.decode(payload.trim())?,
            }),
            SidecarMessage::Opened => Some(ConnectionEvent::Opened),
            SidecarMessage::Closed {
                logged_out,
                status_code,
                message,
            } => Some(ConnectionEvent::Closed {
                logged_out,
                status_code,
                message,
            }),
            SidecarMessage::CommandResult { .. } => None,
        };
        Ok(event)
    }
}

/// A line sent by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentCommand {
    Connect { id: Uuid },
    Logout { id: Uuid },
}

impl AgentCommand {
    pub fn id(&self) -> Uuid {
        match self {
            AgentCommand::Connect { id } | AgentCommand::Logout { id } => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AgentCommand::Connect { .. } => "connect",
            AgentCommand::Logout { .. } => "logout",
        }
    }
}

/// Serialize a command as one protocol line, newline included.
pub fn encode_line(command: &AgentCommand) -> BridgeResult<String> {
    let mut line = serde_json::to_string(command)?;
    line.push('\n');
    Ok(line)
}

/// Parse one protocol line from the sidecar.
pub fn decode_line(line: &str) -> BridgeResult<SidecarMessage> {
    Ok(serde_json::from_str(line.trim())?)
}
