//! Cross-process lock over a spool directory.
//!
//! Every process that opens the same spool root (the server, each CLI
//! invocation) takes this lock around a record read-modify-write, so a
//! change made by one process is never overwritten by another.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;

/// Name of the lock file inside the spool root.
pub const LOCK_FILE: &str = ".spool.lock";

/// Held exclusive lock; released on drop.
#[derive(Debug)]
pub struct SpoolLock {
    _file: File,
}

impl SpoolLock {
    /// Block until the exclusive lock on `root` is acquired.
    ///
    /// Runs on the blocking pool since acquiring may wait on another process.
    pub async fn acquire(root: &Path) -> AppResult<Self> {
        let path = root.join(LOCK_FILE);
        tokio::task::spawn_blocking(move || Self::acquire_blocking(path))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Spool lock task panicked", e))?
    }

    fn acquire_blocking(path: PathBuf) -> AppResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open spool lock: {}", path.display()),
                    e,
                )
            })?;
        file.lock().map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to lock spool: {}", path.display()),
                e,
            )
        })?;
        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_excludes_second_holder_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let first = SpoolLock::acquire(dir.path()).await.unwrap();

        let root = dir.path().to_path_buf();
        let mut second = tokio::spawn(async move { SpoolLock::acquire(&root).await });
        assert!(
            tokio::time::timeout(Duration::from_millis(100), &mut second)
                .await
                .is_err(),
            "second lock acquired while the first was held"
        );

        drop(first);
        let second = tokio::time::timeout(Duration::from_secs(5), second)
            .await
            .expect("lock never released")
            .unwrap();
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_missing_root_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SpoolLock::acquire(&dir.path().join("gone")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }
}
