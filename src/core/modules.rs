//! core::modules
//!
//! Behavior modules attached to locations.
//!
//! # Overview
//!
//! A location carries a map from module kind to module configuration.
//! Today the only module is `occupancy`, whose configuration is an
//! ordered list of [`OccupancySource`] entries. Module validation is
//! independent of hierarchy concerns: nothing here looks at parents,
//! children, or sibling order.
//!
//! # Defaults
//!
//! When a caller omits the mode, defaults are chosen by the source
//! category inferred from the entity domain:
//!
//! | category      | mode         | on_timeout | off_event |
//! |---------------|--------------|------------|-----------|
//! | media player  | `any_change` | 1800       | `none`    |
//! | binary sensor | `state`      | unset      | `none`    |
//! | other         | `state`      | unset      | `none`    |
//!
//! An explicit mode always wins and suppresses category defaults.
//!
//! # Example
//!
//! ```
//! use spacetree::core::modules::{OccupancyDefaults, SourceMode, SourceSpec};
//!
//! let source = SourceSpec::new("media_player.tv")
//!     .resolve(&OccupancyDefaults::default())
//!     .unwrap();
//! assert_eq!(source.mode, SourceMode::AnyChange);
//! assert_eq!(source.on_timeout, Some(1800));
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default `on_timeout` (seconds) applied to media player sources.
pub const DEFAULT_MEDIA_PLAYER_TIMEOUT: u64 = 1800;

/// Errors from module validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModuleError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("unrecognized source mode '{0}'")]
    InvalidMode(String),

    #[error("unrecognized off event '{0}'")]
    InvalidOffEvent(String),

    #[error("invalid entity id '{0}': expected '<domain>.<object>'")]
    InvalidEntityId(String),

    #[error("entity '{entity_id}' is already attached to module '{module}'")]
    DuplicateSource { module: ModuleKind, entity_id: String },

    #[error("entity '{entity_id}' is not attached to module '{module}'")]
    SourceNotFound { module: ModuleKind, entity_id: String },
}

/// Known module kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    Occupancy,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Occupancy => "occupancy",
        }
    }
}

impl FromStr for ModuleKind {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "occupancy" => Ok(ModuleKind::Occupancy),
            other => Err(ModuleError::UnknownModule(other.to_string())),
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a source's state is interpreted as occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Occupied while the entity reports an active state.
    State,
    /// Any state change marks the location occupied.
    AnyChange,
    /// Occupied for `on_timeout` seconds after activity.
    Timeout,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::State => "state",
            SourceMode::AnyChange => "any_change",
            SourceMode::Timeout => "timeout",
        }
    }
}

impl FromStr for SourceMode {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "state" => Ok(SourceMode::State),
            "any_change" => Ok(SourceMode::AnyChange),
            "timeout" => Ok(SourceMode::Timeout),
            other => Err(ModuleError::InvalidMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the end of occupancy is derived from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffEvent {
    /// The source never ends occupancy on its own.
    None,
    /// A specific state transition ends occupancy.
    SpecificEvent,
}

impl OffEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffEvent::None => "none",
            OffEvent::SpecificEvent => "specific_event",
        }
    }
}

impl FromStr for OffEvent {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OffEvent::None),
            "specific_event" => Ok(OffEvent::SpecificEvent),
            other => Err(ModuleError::InvalidOffEvent(other.to_string())),
        }
    }
}

impl std::fmt::Display for OffEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source category, inferred from the entity domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCategory {
    MediaPlayer,
    BinarySensor,
    Other,
}

impl SourceCategory {
    /// Infer the category from an entity id such as `media_player.tv`.
    pub fn infer(entity_id: &str) -> Self {
        match entity_id.split_once('.').map(|(domain, _)| domain) {
            Some("media_player") => SourceCategory::MediaPlayer,
            Some("binary_sensor") => SourceCategory::BinarySensor,
            _ => SourceCategory::Other,
        }
    }
}

/// Tunable defaults for occupancy sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyDefaults {
    /// `on_timeout` for media players when mode is omitted.
    pub media_player_timeout: u64,
}

impl Default for OccupancyDefaults {
    fn default() -> Self {
        Self {
            media_player_timeout: DEFAULT_MEDIA_PLAYER_TIMEOUT,
        }
    }
}

/// A fully resolved occupancy source as stored on a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OccupancySource {
    pub entity_id: String,
    pub mode: SourceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_timeout: Option<u64>,
    pub off_event: OffEvent,
}

/// Caller input for attaching a source. Omitted fields get defaults.
///
/// Mode and off event arrive as raw strings so that unrecognized values
/// are reported as typed errors instead of failing at the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub entity_id: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub on_timeout: Option<u64>,
    #[serde(default)]
    pub off_event: Option<String>,
}

impl SourceSpec {
    /// Spec with only an entity id; everything else defaulted.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Default::default()
        }
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn on_timeout(mut self, seconds: u64) -> Self {
        self.on_timeout = Some(seconds);
        self
    }

    pub fn off_event(mut self, off_event: impl Into<String>) -> Self {
        self.off_event = Some(off_event.into());
        self
    }

    /// Validate the spec and apply category defaults.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::InvalidEntityId`] if the entity id is not `<domain>.<object>`
    /// - [`ModuleError::InvalidMode`] if the mode is not recognized
    /// - [`ModuleError::InvalidOffEvent`] if the off event is not recognized
    pub fn resolve(&self, defaults: &OccupancyDefaults) -> Result<OccupancySource, ModuleError> {
        validate_entity_id(&self.entity_id)?;

        let off_event = match &self.off_event {
            Some(raw) => raw.parse()?,
            None => OffEvent::None,
        };

        let (mode, default_timeout) = match &self.mode {
            Some(raw) => (raw.parse()?, None),
            None => match SourceCategory::infer(&self.entity_id) {
                SourceCategory::MediaPlayer => {
                    (SourceMode::AnyChange, Some(defaults.media_player_timeout))
                }
                SourceCategory::BinarySensor | SourceCategory::Other => (SourceMode::State, None),
            },
        };

        Ok(OccupancySource {
            entity_id: self.entity_id.clone(),
            mode,
            on_timeout: self.on_timeout.or(default_timeout),
            off_event,
        })
    }
}

fn validate_entity_id(entity_id: &str) -> Result<(), ModuleError> {
    let well_formed = match entity_id.split_once('.') {
        Some((domain, object)) => {
            !domain.is_empty()
                && !object.is_empty()
                && !entity_id.chars().any(|c| c.is_whitespace() || c.is_control())
        }
        None => false,
    };
    if well_formed {
        Ok(())
    } else {
        Err(ModuleError::InvalidEntityId(entity_id.to_string()))
    }
}

/// Configuration block for one module on one location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
    pub sources: Vec<OccupancySource>,
}

/// All module configuration attached to a location.
pub type Modules = BTreeMap<ModuleKind, ModuleConfig>;

/// Attach a resolved source under `kind`.
///
/// # Errors
///
/// [`ModuleError::DuplicateSource`] if the entity is already attached.
pub fn attach(
    modules: &mut Modules,
    kind: ModuleKind,
    source: OccupancySource,
) -> Result<(), ModuleError> {
    let config = modules.entry(kind).or_default();
    if config
        .sources
        .iter()
        .any(|s| s.entity_id == source.entity_id)
    {
        return Err(ModuleError::DuplicateSource {
            module: kind,
            entity_id: source.entity_id,
        });
    }
    config.sources.push(source);
    Ok(())
}

/// Remove the source for `entity_id` under `kind`.
///
/// A module whose last source is removed is dropped entirely.
///
/// # Errors
///
/// [`ModuleError::SourceNotFound`] if no such source is attached.
pub fn remove(
    modules: &mut Modules,
    kind: ModuleKind,
    entity_id: &str,
) -> Result<OccupancySource, ModuleError> {
    let not_found = || ModuleError::SourceNotFound {
        module: kind,
        entity_id: entity_id.to_string(),
    };

    let config = modules.get_mut(&kind).ok_or_else(not_found)?;
    let pos = config
        .sources
        .iter()
        .position(|s| s.entity_id == entity_id)
        .ok_or_else(not_found)?;
    let removed = config.sources.remove(pos);

    if config.sources.is_empty() {
        modules.remove(&kind);
    }
    Ok(removed)
}

/// Sources under `kind`, in attachment order.
pub fn sources(modules: &Modules, kind: ModuleKind) -> Vec<OccupancySource> {
    modules
        .get(&kind)
        .map(|c| c.sources.clone())
        .unwrap_or_default()
}
