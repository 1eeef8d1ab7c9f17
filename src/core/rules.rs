//! core::rules
//!
//! Allowed-parent table for location types.
//!
//! | child                          | permitted parents                       |
//! |--------------------------------|-----------------------------------------|
//! | `house`, `building`, `grounds` | none (root only)                        |
//! | `floor`                        | `building`, `house`                     |
//! | `room`, `area`                 | `floor`, `building`, `house`, `room`, `area` |
//!
//! Placing any type at the root is permitted unless the caller tightens
//! the rules with an explicit set of root types. Nesting of rooms and
//! areas inside each other can likewise be switched off.

use std::collections::BTreeSet;

use super::types::LocationType;

/// A rejected parent/child pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleViolation {
    pub child: LocationType,
    pub parent: Option<LocationType>,
}

/// Hierarchy placement rules, enforced on create, retype, and move.
///
/// # Example
///
/// ```
/// use spacetree::core::rules::HierarchyRules;
/// use spacetree::core::types::LocationType;
///
/// let rules = HierarchyRules::default();
/// assert!(rules.check(LocationType::Floor, Some(LocationType::Building)).is_ok());
/// assert!(rules.check(LocationType::Floor, Some(LocationType::Room)).is_err());
/// assert!(rules.check(LocationType::Room, None).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyRules {
    /// When set, only these types may sit at the root.
    pub root_types: Option<BTreeSet<LocationType>>,
    /// Whether rooms and areas may nest inside rooms and areas.
    pub allow_nested_rooms: bool,
}

impl Default for HierarchyRules {
    fn default() -> Self {
        Self::structural()
    }
}

impl HierarchyRules {
    /// The fixed type table with no caller tightening.
    ///
    /// Stored data is judged against this; tightened rules only govern new
    /// placements.
    pub fn structural() -> Self {
        Self {
            root_types: None,
            allow_nested_rooms: true,
        }
    }

    /// Parent types permitted for `child` under these rules.
    pub fn allowed_parents(&self, child: LocationType) -> &'static [LocationType] {
        use LocationType::*;
        match child {
            House | Building | Grounds => &[],
            Floor => &[Building, House],
            Room | Area if self.allow_nested_rooms => &[Floor, Building, House, Room, Area],
            Room | Area => &[Floor, Building, House],
        }
    }

    /// Check whether `child` may be placed under `parent` (`None` = root).
    pub fn check(
        &self,
        child: LocationType,
        parent: Option<LocationType>,
    ) -> Result<(), RuleViolation> {
        let allowed = match parent {
            None => self
                .root_types
                .as_ref()
                .map_or(true, |roots| roots.contains(&child)),
            Some(parent_type) => self.allowed_parents(child).contains(&parent_type),
        };

        if allowed {
            Ok(())
        } else {
            Err(RuleViolation { child, parent })
        }
    }
}
