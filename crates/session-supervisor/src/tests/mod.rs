//! Integration tests for the session supervisor.
//!
//! - `harness.rs`   - Mock collaborators and a running supervisor
//! - `reconnect.rs` - Automatic reconnect and the reconnect guard
//! - `logout.rs`    - Remote logout: wipe, then wait for the operator
//! - `operator.rs`  - Confirm token and lifecycle commands
//! - `faults.rs`    - Fault classification and escalation
//! - `scenarios.rs` - Multi-step sequences and state invariants

mod logout;
mod operator;
mod scenarios;
