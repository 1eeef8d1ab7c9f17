//! core::ops::lock
//!
//! Exclusive lock on the persisted location store.
//!
//! # Architecture
//!
//! The in-process engine serializes writers with its own lock. This lock
//! covers the other axis: several `st` processes (or an embedding service
//! and the CLI) sharing one data directory. It is an OS-level advisory
//! lock on `<data_dir>/locations.lock` held for the duration of a
//! load-mutate-save cycle.
//!
//! # Invariants
//!
//! - Lock is released on drop (RAII)
//! - Acquisition waits at most the configured timeout, then fails with
//!   [`LockError::Busy`]; it never blocks indefinitely
//!
//! # Example
//!
//! ```ignore
//! use spacetree::core::ops::lock::StoreLock;
//! use spacetree::core::paths::SpacePaths;
//! use std::time::Duration;
//!
//! let paths = SpacePaths::new("/var/lib/spacetree");
//! let lock = StoreLock::acquire(&paths, Duration::from_millis(250))?;
//! // load, mutate, save
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::SpacePaths;

/// Interval between acquisition attempts while waiting.
const RETRY_INTERVAL: Duration = Duration::from_millis(5);

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder kept the lock for longer than the timeout.
    #[error("location store is busy (lock not acquired within {timeout:?})")]
    Busy { timeout: Duration },

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on the persisted store.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    /// Held while `Some`.
    file: Option<File>,
}

impl StoreLock {
    /// Acquire the store lock, waiting up to `timeout`.
    ///
    /// # Errors
    ///
    /// - [`LockError::Busy`] if the lock is still held after `timeout`
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock call fails
    pub fn acquire(paths: &SpacePaths, timeout: Duration) -> Result<Self, LockError> {
        let data_dir = paths.data_dir();
        fs::create_dir_all(data_dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", data_dir.display(), e))
        })?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    return Ok(Self {
                        path,
                        file: Some(file),
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::warn!(path = %path.display(), ?timeout, "store lock busy");
                        return Err(LockError::Busy { timeout });
                    }
                    std::thread::sleep(RETRY_INTERVAL.min(deadline - now));
                }
                Err(e) => return Err(LockError::AcquireFailed(e.to_string())),
            }
        }
    }

    /// Try once, returning `None` if another holder has the lock.
    pub fn try_acquire(paths: &SpacePaths) -> Result<Option<Self>, LockError> {
        match Self::acquire(paths, Duration::ZERO) {
            Ok(lock) => Ok(Some(lock)),
            Err(LockError::Busy { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
