//! core::paths
//!
//! Centralized path routing for spacetree storage locations.
//!
//! # Storage Layout
//!
//! All data lives under one data directory:
//! - `locations.json` - Persisted location set
//! - `locations.lock` - Exclusive lock file
//!
//! The data directory defaults to `~/.spacetree` and can be overridden by
//! configuration or the `--data-dir` flag.
//!
//! # Example
//!
//! ```
//! use spacetree::core::paths::SpacePaths;
//! use std::path::PathBuf;
//!
//! let paths = SpacePaths::new("/var/lib/spacetree");
//! assert_eq!(paths.store_path(), PathBuf::from("/var/lib/spacetree/locations.json"));
//! assert_eq!(paths.lock_path(), PathBuf::from("/var/lib/spacetree/locations.lock"));
//! ```

use std::path::{Path, PathBuf};

/// File name of the persisted location set.
pub const STORE_FILE: &str = "locations.json";

/// File name of the store lock.
pub const LOCK_FILE: &str = "locations.lock";

/// Centralized path routing.
///
/// No code outside this module should join file names onto the data dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacePaths {
    data_dir: PathBuf,
}

impl SpacePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Paths rooted at the default data directory (`~/.spacetree`).
    ///
    /// Returns `None` if no home directory can be determined.
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".spacetree")))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }

    /// Temp file used for atomic writes of the store.
    pub fn store_temp_path(&self) -> PathBuf {
        self.data_dir.join(format!("{STORE_FILE}.tmp"))
    }
}
