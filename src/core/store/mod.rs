//! core::store
//!
//! Location store: the record table and its persisted form.
//!
//! # Modules
//!
//! - [`table`] - In-memory table of location records
//! - [`schema`] - Persisted document schema (v1)
//! - [`file`] - Atomic file persistence under the store lock

pub mod file;
pub mod schema;
pub mod table;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::ops::lock::LockError;

pub use file::FileStore;
pub use schema::{parse_document, StoreDocument, DOCUMENT_KIND, SCHEMA_VERSION};
pub use table::LocationTable;

/// Errors from persisting or loading the location set.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse store: {0}")]
    Parse(String),

    #[error("failed to serialize store: {0}")]
    Serialize(String),

    #[error("invalid document kind '{found}', expected '{}'", DOCUMENT_KIND)]
    InvalidKind { found: String },

    #[error("unsupported schema version {0}, supported: {SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("store fingerprint mismatch: recorded {expected}, computed {actual}")]
    FingerprintMismatch { expected: String, actual: String },

    #[error(transparent)]
    Lock(#[from] LockError),
}
