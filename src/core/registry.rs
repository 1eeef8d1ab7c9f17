//! core::registry
//!
//! Read-only view of the external area and entity registries.
//!
//! # Design
//!
//! Areas and entities are owned elsewhere. The engine only asks whether
//! an identifier exists before storing a reference to it, and never
//! writes back. An engine without a registry accepts any well-formed
//! identifier.
//!
//! Implementations must be thread-safe (Send + Sync).

use std::collections::HashSet;

/// Existence checks against external registries.
pub trait Registry: Send + Sync {
    /// Whether `area_id` names a known area.
    fn area_exists(&self, area_id: &str) -> bool;

    /// Whether `entity_id` names a known entity.
    fn entity_exists(&self, entity_id: &str) -> bool;
}

/// A fixed registry snapshot, useful for embedding and tests.
///
/// # Example
///
/// ```
/// use spacetree::core::registry::{Registry, StaticRegistry};
///
/// let registry = StaticRegistry::new()
///     .with_area("kitchen")
///     .with_entity("binary_sensor.kitchen_motion");
/// assert!(registry.area_exists("kitchen"));
/// assert!(!registry.entity_exists("media_player.tv"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    areas: HashSet<String>,
    entities: HashSet<String>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_area(mut self, area_id: impl Into<String>) -> Self {
        self.areas.insert(area_id.into());
        self
    }

    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entities.insert(entity_id.into());
        self
    }
}

impl Registry for StaticRegistry {
    fn area_exists(&self, area_id: &str) -> bool {
        self.areas.contains(area_id)
    }

    fn entity_exists(&self, entity_id: &str) -> bool {
        self.entities.contains(entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = StaticRegistry::new();
        assert!(!registry.area_exists("kitchen"));
        assert!(!registry.entity_exists("binary_sensor.a"));
    }

    #[test]
    fn usable_as_trait_object() {
        let registry: Box<dyn Registry> = Box::new(StaticRegistry::new().with_entity("media_player.tv"));
        assert!(registry.entity_exists("media_player.tv"));
    }
}
