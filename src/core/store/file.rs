//! core::store::file
//!
//! File-backed persistence for the location set.
//!
//! # Architecture
//!
//! The whole location set is one JSON document at
//! `<data_dir>/locations.json`. Writes go to a temp file in the same
//! directory, are fsynced, then renamed over the target, so readers see
//! either the old or the new document and never a partial one.
//!
//! Callers that load, mutate, and save hold a [`StoreLock`] across the
//! whole cycle; see [`FileStore::lock`].

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use super::schema::{parse_document, StoreDocument};
use super::StoreError;
use crate::core::ops::lock::StoreLock;
use crate::core::paths::SpacePaths;

/// Persisted location store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: SpacePaths,
    lock_timeout: Duration,
}

impl FileStore {
    pub fn new(paths: SpacePaths, lock_timeout: Duration) -> Self {
        Self {
            paths,
            lock_timeout,
        }
    }

    pub fn paths(&self) -> &SpacePaths {
        &self.paths
    }

    /// Acquire the store lock with the configured bounded wait.
    pub fn lock(&self) -> Result<StoreLock, StoreError> {
        Ok(StoreLock::acquire(&self.paths, self.lock_timeout)?)
    }

    /// Load the persisted document.
    ///
    /// Returns `Ok(None)` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<StoreDocument>, StoreError> {
        let path = self.paths.store_path();
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e,
        })?;
        let doc = parse_document(&json)?;
        tracing::debug!(path = %path.display(), records = doc.locations.len(), "loaded store");
        Ok(Some(doc))
    }

    /// Write the document atomically.
    pub fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let path = self.paths.store_path();
        let temp_path = self.paths.store_temp_path();
        fs::create_dir_all(self.paths.data_dir()).map_err(io_error(self.paths.data_dir()))?;

        let contents = doc.to_canonical_json()?;
        let mut file = fs::File::create(&temp_path).map_err(io_error(&temp_path))?;
        file.write_all(contents.as_bytes())
            .map_err(io_error(&temp_path))?;
        file.sync_all().map_err(io_error(&temp_path))?;

        fs::rename(&temp_path, &path).map_err(io_error(&path))?;
        tracing::debug!(path = %path.display(), records = doc.locations.len(), "saved store");
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}
