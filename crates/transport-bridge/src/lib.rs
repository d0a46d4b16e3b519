//! Bridge to the transport sidecar.
//!
//! The messaging wire protocol runs in a separate sidecar process. The agent
//! talks to it over a Unix socket carrying newline-delimited JSON: the
//! sidecar streams connection events, and the agent sends `connect` and
//! `logout` commands, each answered by a `command_result` with the same id.

mod bridge;
mod error;
mod protocol;

pub use bridge::{
    connect_with_retry, BridgeReader, BridgeTransport, EventSink, DISCONNECTED_MESSAGE,
};
pub use error::{BridgeError, BridgeResult};
pub use protocol::{decode_line, encode_line, AgentCommand, SidecarMessage};
