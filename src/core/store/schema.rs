//! core::store::schema
//!
//! Persisted document schema (v1).
//!
//! # Schema Design
//!
//! - Self-describing with `kind` and `schema_version`
//! - Strictly parsed (unknown fields rejected)
//! - Carries a content fingerprint so truncated or hand-edited files are
//!   detected instead of silently loaded
//!
//! The hierarchy index is not persisted; it is rebuilt from the records.
//!
//! # Example
//!
//! ```
//! use spacetree::core::store::schema::{parse_document, StoreDocument, DOCUMENT_KIND};
//!
//! let doc = StoreDocument::from_locations(vec![]).unwrap();
//! assert_eq!(doc.kind, DOCUMENT_KIND);
//!
//! let json = doc.to_canonical_json().unwrap();
//! let parsed = parse_document(&json).unwrap();
//! assert!(parsed.locations.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::core::location::Location;
use crate::core::types::{Fingerprint, UtcTimestamp};

/// The kind identifier for persisted location sets.
pub const DOCUMENT_KIND: &str = "spacetree.locations";

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Envelope for version dispatch before full parsing.
#[derive(Debug, Deserialize)]
struct DocumentEnvelope {
    kind: String,
    schema_version: u32,
}

/// Parse a persisted document with version dispatch and fingerprint check.
///
/// Structural verification of the records themselves happens later, when
/// the engine rebuilds its index.
///
/// # Errors
///
/// - [`StoreError::Parse`] for malformed JSON or unknown fields
/// - [`StoreError::InvalidKind`] / [`StoreError::UnsupportedVersion`]
/// - [`StoreError::FingerprintMismatch`] if the content hash disagrees
pub fn parse_document(json: &str) -> Result<StoreDocument, StoreError> {
    let envelope: DocumentEnvelope =
        serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;

    if envelope.kind != DOCUMENT_KIND {
        return Err(StoreError::InvalidKind {
            found: envelope.kind,
        });
    }

    match envelope.schema_version {
        1 => {
            let doc: StoreDocument =
                serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;
            doc.verify_fingerprint()?;
            Ok(doc)
        }
        v => Err(StoreError::UnsupportedVersion(v)),
    }
}

/// The persisted location set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StoreDocument {
    /// Kind identifier (always "spacetree.locations")
    pub kind: String,

    /// Schema version (always 1 for this struct)
    pub schema_version: u32,

    /// When this document was written
    pub saved_at: UtcTimestamp,

    /// Hash over the records, keyed by id
    pub fingerprint: Fingerprint,

    /// Location records, sorted by id
    pub locations: Vec<Location>,
}

impl StoreDocument {
    /// Build a document over `locations`, sorting by id and fingerprinting.
    pub fn from_locations(mut locations: Vec<Location>) -> Result<Self, StoreError> {
        locations.sort_by(|a, b| a.id.cmp(&b.id));
        let fingerprint = fingerprint_of(&locations)?;
        Ok(Self {
            kind: DOCUMENT_KIND.to_string(),
            schema_version: SCHEMA_VERSION,
            saved_at: UtcTimestamp::now(),
            fingerprint,
            locations,
        })
    }

    /// Serialize to pretty JSON with a trailing newline.
    pub fn to_canonical_json(&self) -> Result<String, StoreError> {
        let mut json =
            serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialize(e.to_string()))?;
        json.push('\n');
        Ok(json)
    }

    /// Check the stored fingerprint against the records.
    pub fn verify_fingerprint(&self) -> Result<(), StoreError> {
        let actual = fingerprint_of(&self.locations)?;
        if actual == self.fingerprint {
            Ok(())
        } else {
            Err(StoreError::FingerprintMismatch {
                expected: self.fingerprint.to_string(),
                actual: actual.to_string(),
            })
        }
    }
}

fn fingerprint_of(locations: &[Location]) -> Result<Fingerprint, StoreError> {
    let encoded = locations
        .iter()
        .map(|loc| {
            serde_json::to_string(loc)
                .map(|json| (loc.id.as_str(), json))
                .map_err(|e| StoreError::Serialize(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Fingerprint::compute(
        encoded.iter().map(|(id, json)| (*id, json.as_str())),
    ))
}
