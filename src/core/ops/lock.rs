//! core::ops::lock
//!
//! Per-repository publish lock.
//!
//! # Architecture
//!
//! The backing repository is the only shared mutable resource. Remote
//! conflicts are detected by the store (optimistic concurrency), but local
//! invocations targeting the same repository additionally serialize their
//! read-modify-publish cycles through this lock so that two operators on
//! one machine never race each other's retries.
//!
//! # Storage
//!
//! - `<home>/locks/<hash>.lock` - Lock file with OS-level exclusive lock,
//!   one per backing repository URL
//!
//! # Invariants
//!
//! - Lock is held for the whole read-modify-publish cycle, retries included
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock is advisory: it does not coordinate with other machines
//!
//! # Example
//!
//! ```ignore
//! use lodestar::core::ops::lock::PublishLock;
//!
//! let lock = PublishLock::acquire(&paths, "https://example.com/org/deploy")?;
//! // read, modify, publish ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::LodestarPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("repository is locked by another lodestar process")]
    AlreadyLocked,

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on publishing to one backing repository.
#[derive(Debug)]
pub struct PublishLock {
    /// The open lock file; the OS lock is held for as long as it lives.
    file: File,
}

impl PublishLock {
    /// Acquire the lock for `repo_url`, waiting if another process holds it.
    ///
    /// # Errors
    ///
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(paths: &LodestarPaths, repo_url: &str) -> Result<Self, LockError> {
        let (path, file) = Self::open(paths, repo_url)?;

        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::info!(lock = %path.display(), "waiting for another lodestar process");
                file.lock_exclusive()
                    .map_err(|e| LockError::AcquireFailed(e.to_string()))?;
            }
            Err(e) => return Err(LockError::AcquireFailed(e.to_string())),
        }

        tracing::debug!(lock = %path.display(), "acquired publish lock");
        Ok(Self { file })
    }

    /// Acquire the lock for `repo_url` without waiting.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    pub fn try_acquire(paths: &LodestarPaths, repo_url: &str) -> Result<Self, LockError> {
        let (_, file) = Self::open(paths, repo_url)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    fn open(paths: &LodestarPaths, repo_url: &str) -> Result<(PathBuf, File), LockError> {
        let dir = paths.locks_dir();
        fs::create_dir_all(&dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let path = paths.publish_lock_path(repo_url);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        Ok((path, file))
    }
}

impl Drop for PublishLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
