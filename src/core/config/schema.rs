//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: location types must be recognized,
//! timeouts must be positive.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::LocationType;

/// Configuration file contents.
///
/// # Example
///
/// ```toml
/// data_dir = "/var/lib/spacetree"
/// lock_timeout_ms = 250
///
/// [hierarchy]
/// root_types = ["building", "grounds"]
/// allow_nested_rooms = true
///
/// [occupancy]
/// media_player_timeout = 1800
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Directory holding the persisted store
    pub data_dir: Option<PathBuf>,

    /// Bounded wait for store and hierarchy locks, in milliseconds
    pub lock_timeout_ms: Option<u64>,

    /// Placement rule overrides
    pub hierarchy: Option<HierarchyConfig>,

    /// Occupancy module defaults
    pub occupancy: Option<OccupancyConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue(
                "lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(hierarchy) = &self.hierarchy {
            hierarchy.validate()?;
        }
        if let Some(occupancy) = &self.occupancy {
            occupancy.validate()?;
        }
        Ok(())
    }
}

/// Placement rule overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HierarchyConfig {
    /// Restrict which types may sit at the root
    pub root_types: Option<Vec<String>>,

    /// Allow rooms and areas inside rooms and areas
    pub allow_nested_rooms: Option<bool>,
}

impl HierarchyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_root_types().map(|_| ())
    }

    /// Root types as a parsed set, if configured.
    pub fn parsed_root_types(&self) -> Result<Option<BTreeSet<LocationType>>, ConfigError> {
        let Some(raw) = &self.root_types else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Err(ConfigError::InvalidValue(
                "hierarchy.root_types cannot be empty".to_string(),
            ));
        }
        raw.iter()
            .map(|t| {
                t.parse::<LocationType>()
                    .map_err(|e| ConfigError::InvalidValue(format!("hierarchy.root_types: {e}")))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Some)
    }
}

/// Occupancy module defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OccupancyConfig {
    /// Default `on_timeout` in seconds for media player sources
    pub media_player_timeout: Option<u64>,
}

impl OccupancyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.media_player_timeout == Some(0) {
            return Err(ConfigError::InvalidValue(
                "occupancy.media_player_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
