//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`LocationId`] - Validated, immutable location identifier
//! - [`LocationType`] - Kind of space a location models
//! - [`UtcTimestamp`] - RFC3339 timestamp
//! - [`Fingerprint`] - Content hash over a location set
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use spacetree::core::types::{LocationId, LocationType};
//!
//! let id = LocationId::new("living-room").unwrap();
//! assert_eq!(id.as_str(), "living-room");
//!
//! let kind: LocationType = "floor".parse().unwrap();
//! assert_eq!(kind, LocationType::Floor);
//!
//! assert!(LocationId::new("has space").is_err());
//! assert!("castle".parse::<LocationType>().is_err());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid location id: {0}")]
    InvalidLocationId(String),

    #[error("unrecognized location type '{0}'")]
    InvalidType(String),
}

/// Maximum length of a location id.
pub const MAX_ID_LEN: usize = 64;

/// A validated location identifier.
///
/// Ids are immutable once a location is created. They must:
/// - Be non-empty and at most [`MAX_ID_LEN`] characters
/// - Contain only ASCII letters, digits, `-`, `_` and `.`
/// - Not start with `-` or `.`
///
/// # Example
///
/// ```
/// use spacetree::core::types::LocationId;
///
/// assert!(LocationId::new("main-floor").is_ok());
/// assert!(LocationId::new("area_51").is_ok());
///
/// assert!(LocationId::new("").is_err());
/// assert!(LocationId::new("-leading").is_err());
/// assert!(LocationId::new("a/b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationId(String);

impl LocationId {
    /// Create a new validated location id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLocationId` if the id violates the rules above.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Generate a fresh random id (`loc_` followed by 12 hex characters).
    pub fn generate() -> Self {
        let raw = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("loc_{}", &raw[..12]))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.is_empty() {
            return Err(TypeError::InvalidLocationId(
                "location id cannot be empty".into(),
            ));
        }
        if id.len() > MAX_ID_LEN {
            return Err(TypeError::InvalidLocationId(format!(
                "location id cannot exceed {MAX_ID_LEN} characters"
            )));
        }
        if id.starts_with('-') || id.starts_with('.') {
            return Err(TypeError::InvalidLocationId(
                "location id cannot start with '-' or '.'".into(),
            ));
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(TypeError::InvalidLocationId(format!(
                "location id cannot contain {c:?}"
            )));
        }
        Ok(())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LocationId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LocationId> for String {
    fn from(id: LocationId) -> Self {
        id.0
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of space a location models.
///
/// The type constrains which parent types are permitted; see
/// [`crate::core::rules::HierarchyRules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    House,
    Building,
    Grounds,
    Floor,
    Room,
    Area,
}

impl LocationType {
    /// All recognized location types.
    pub const ALL: [LocationType; 6] = [
        LocationType::House,
        LocationType::Building,
        LocationType::Grounds,
        LocationType::Floor,
        LocationType::Room,
        LocationType::Area,
    ];

    /// Stable lowercase name used in persisted state and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::House => "house",
            LocationType::Building => "building",
            LocationType::Grounds => "grounds",
            LocationType::Floor => "floor",
            LocationType::Room => "room",
            LocationType::Area => "area",
        }
    }

    /// Whether this is a structural top-level type that never takes a parent.
    pub fn is_natural_root(&self) -> bool {
        matches!(
            self,
            LocationType::House | LocationType::Building | LocationType::Grounds
        )
    }
}

impl FromStr for LocationType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| TypeError::InvalidType(s.to_string()))
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A UTC timestamp in RFC3339 format.
///
/// # Example
///
/// ```
/// use spacetree::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// A stable content hash over a set of keyed entries.
///
/// Used to detect on-disk tampering or truncation of the persisted
/// location set. Entries are sorted by key before hashing so the result
/// does not depend on input order.
///
/// # Example
///
/// ```
/// use spacetree::core::types::Fingerprint;
///
/// let a = Fingerprint::compute([("kitchen", "{}"), ("attic", "{}")]);
/// let b = Fingerprint::compute([("attic", "{}"), ("kitchen", "{}")]);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from `(key, content)` pairs.
    pub fn compute<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Sha256::new();
        for (key, content) in sorted {
            hasher.update(key.as_bytes());
            hasher.update(b"\0");
            hasher.update(content.as_bytes());
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
