//! core::location
//!
//! The location record and the caller-facing inputs that create or patch it.
//!
//! # Fields
//!
//! - `id` is immutable once created
//! - `parent_id = None` means the location is a root
//! - `is_explicit_root` distinguishes a location promoted to root by a move
//!   from one that never had a parent
//! - `order_index` orders siblings that share a `parent_id`
//! - `ha_area_id` is an opaque reference into an external area registry;
//!   it is stored and round-tripped, never interpreted

use serde::{Deserialize, Serialize};

use super::modules::Modules;
use super::types::{LocationId, LocationType};

/// A node in the space hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    #[serde(default)]
    pub parent_id: Option<LocationId>,
    #[serde(default)]
    pub is_explicit_root: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ha_area_id: Option<String>,
    pub order_index: u32,
    #[serde(default, skip_serializing_if = "Modules::is_empty")]
    pub modules: Modules,
}

impl Location {
    /// Whether this location currently has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Fields for creating a location.
///
/// The type arrives as a raw string so an unrecognized value surfaces as
/// `InvalidType` from the engine rather than as a transport parse failure.
///
/// # Example
///
/// ```
/// use spacetree::core::location::NewLocation;
/// use spacetree::core::types::LocationId;
///
/// let fields = NewLocation::new("Kitchen", "room")
///     .with_id(LocationId::new("kitchen").unwrap())
///     .under(LocationId::new("main-floor").unwrap());
/// assert_eq!(fields.location_type, "room");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLocation {
    /// Requested id; generated when absent.
    #[serde(default)]
    pub id: Option<LocationId>,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: String,
    #[serde(default)]
    pub parent_id: Option<LocationId>,
    #[serde(default)]
    pub ha_area_id: Option<String>,
}

impl NewLocation {
    pub fn new(name: impl Into<String>, location_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location_type: location_type.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: LocationId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn under(mut self, parent: LocationId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.ha_area_id = Some(area.into());
        self
    }
}

/// A partial update of mutable location fields.
///
/// Hierarchy placement is not patchable here; use a move instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// `Some(None)` clears the area reference.
    #[serde(default)]
    pub ha_area_id: Option<Option<String>>,
    #[serde(default, rename = "type")]
    pub location_type: Option<String>,
}

impl LocationPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.ha_area_id.is_none() && self.location_type.is_none()
    }
}

/// Normalize a display name, rejecting blank input.
pub(crate) fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_control()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a raw type string.
pub(crate) fn parse_type(raw: &str) -> Result<LocationType, super::types::TypeError> {
    raw.parse()
}
