//! Fault classification.
//!
//! A fault is critical when its message names a condition that a reconnect
//! cannot fix: a rejected session, failed authentication, or a network
//! endpoint that is gone. Everything else is reported and otherwise ignored.

use crate::Fault;

/// Substrings that mark a fault as critical, checked in order.
///
/// Matching is case-sensitive: `ECONNRESET` is an errno name, not prose.
pub const CRITICAL_KEYWORDS: &[&str] = &[
    "invalid session",
    "connection failed",
    "auth",
    "ECONNRESET",
    "EHOSTUNREACH",
    "ENOTFOUND",
];

/// Severity of a process fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Wipe credentials and restart the process.
    Critical,
    /// Tell the operator; nothing else.
    Transient,
}

/// Classify a fault by its message.
pub fn classify(fault: &Fault) -> FaultClass {
    classify_message(&fault.message)
}

/// Classify a raw fault message.
pub fn classify_message(message: &str) -> FaultClass {
    match matched_keyword(message) {
        Some(_) => FaultClass::Critical,
        None => FaultClass::Transient,
    }
}

/// The first critical keyword contained in `message`, if any.
pub fn matched_keyword(message: &str) -> Option<&'static str> {
    CRITICAL_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| message.contains(keyword))
}
