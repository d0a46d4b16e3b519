//! File system paths for the agent.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const BASE_DIR_NAME: &str = ".session-warden";
const TRANSPORT_SOCKET_NAME: &str = "transport.sock";
const CREDENTIALS_DIR_NAME: &str = "credentials";

/// Manages file system paths for the agent.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.session-warden)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.session-warden`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// ~/.session-warden/config.json
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// ~/.session-warden/credentials
    pub fn credentials_dir(&self) -> PathBuf {
        self.base_dir.join(CREDENTIALS_DIR_NAME)
    }

    /// ~/.session-warden/transport.sock
    pub fn transport_socket_file(&self) -> PathBuf {
        self.base_dir.join(TRANSPORT_SOCKET_NAME)
    }

    /// ~/.session-warden/logs
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// ~/.session-warden/logs/warden.jsonl
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("warden.jsonl")
    }

    /// Ensure the base and log directories exist.
    ///
    /// The credentials directory is left alone: its presence means "paired".
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-warden");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.credentials_dir(), base.join("credentials"));
        assert_eq!(paths.transport_socket_file(), base.join("transport.sock"));
        assert_eq!(paths.logs_dir(), base.join("logs"));
        assert_eq!(paths.log_file(), base.join("logs/warden.jsonl"));
    }

    #[test]
    fn test_paths_default() {
        let paths = Paths::new().unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(paths.base_dir(), &home.join(".session-warden"));
    }

    #[test]
    fn test_ensure_dirs_does_not_create_credentials() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("warden"));

        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir().is_dir());
        assert!(!paths.credentials_dir().exists());
    }
}
