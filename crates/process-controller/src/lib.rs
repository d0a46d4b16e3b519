//! Process restart through an external process manager.
//!
//! The agent does not restart itself; it asks whatever supervises it
//! (pm2, systemd, a container runtime) to do so by running a shell command.

use async_trait::async_trait;
use session_supervisor::{ProcessController, RestartError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

/// Runs a restart command through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellProcessController {
    command: String,
    timeout: Duration,
}

impl ShellProcessController {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl ProcessController for ShellProcessController {
    async fn restart(&self) -> Result<(), RestartError> {
        info!(command = %self.command, "Running restart command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.command);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(RestartError::Timeout(self.timeout)),
            Ok(Err(err)) => return Err(RestartError::Spawn(err)),
            Ok(Ok(output)) => output,
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let code = output.status.code();
        warn!(?code, %stderr, "Restart command failed");

        Err(RestartError::CommandFailed {
            code,
            stderr: if stderr.is_empty() { stdout } else { stderr },
        })
    }
}
