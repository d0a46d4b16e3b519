//! Agent application wiring.

mod faults;
mod init;

pub use init::{check_config, run_agent};
