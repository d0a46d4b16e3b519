//! On-disk session credentials.
//!
//! The transport persists its session as a directory of files. The agent
//! never reads them; it only needs to know whether they are there and to
//! delete them when the session is invalidated.

use async_trait::async_trait;
use session_supervisor::{CredentialError, CredentialStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Credentials stored as a directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Refuse to recursively delete the filesystem root or the home directory.
    fn check_wipe_target(&self) -> Result<(), CredentialError> {
        let unsafe_target = self.dir.parent().is_none()
            || self.dir.as_os_str().is_empty()
            || dirs::home_dir().is_some_and(|home| home == self.dir);

        if unsafe_target {
            return Err(CredentialError::UnsafePath(self.dir.display().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    /// True when the directory exists and holds at least one entry.
    async fn exists(&self) -> bool {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(_) => return false,
        };
        matches!(entries.next_entry().await, Ok(Some(_)))
    }

    async fn wipe(&self) -> Result<(), CredentialError> {
        self.check_wipe_target()?;

        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                info!(path = %self.dir.display(), "Removed credentials directory");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.dir.display(), "No credentials directory to remove");
                Ok(())
            }
            Err(e) => Err(CredentialError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn populated_store(root: &Path) -> FileCredentialStore {
        let dir = root.join("credentials");
        std::fs::create_dir_all(dir.join("keys")).unwrap();
        std::fs::write(dir.join("creds.json"), "{}").unwrap();
        std::fs::write(dir.join("keys").join("pre-key-1.json"), "{}").unwrap();
        FileCredentialStore::new(dir)
    }

    #[tokio::test]
    async fn test_exists_with_files() {
        let root = tempdir().unwrap();
        let store = populated_store(root.path());
        assert!(store.exists().await);
    }

    #[tokio::test]
    async fn test_missing_or_empty_dir_does_not_exist() {
        let root = tempdir().unwrap();
        let store = FileCredentialStore::new(root.path().join("credentials"));
        assert!(!store.exists().await);

        std::fs::create_dir_all(store.dir()).unwrap();
        assert!(!store.exists().await);
    }

    #[tokio::test]
    async fn test_wipe_removes_directory_recursively() {
        let root = tempdir().unwrap();
        let store = populated_store(root.path());

        store.wipe().await.unwrap();

        assert!(!store.dir().exists());
        assert!(!store.exists().await);
        assert!(root.path().exists());
    }

    #[tokio::test]
    async fn test_wipe_is_idempotent() {
        let root = tempdir().unwrap();
        let store = populated_store(root.path());

        store.wipe().await.unwrap();
        store.wipe().await.unwrap();
    }

    #[tokio::test]
    async fn test_wipe_refuses_root() {
        let store = FileCredentialStore::new("/");
        assert!(matches!(
            store.wipe().await,
            Err(CredentialError::UnsafePath(_))
        ));
    }

    #[tokio::test]
    async fn test_wipe_refuses_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let store = FileCredentialStore::new(home);
        assert!(matches!(
            store.wipe().await,
            Err(CredentialError::UnsafePath(_))
        ));
    }
}
