//! engine::state
//!
//! The lock-protected state: record table, hierarchy index, version.
//!
//! # Invariants
//!
//! After every committed transition:
//! - The index holds exactly the ids in the table
//! - Each record's `parent_id` matches its index parent
//! - Each record's `order_index` equals its position in its sibling group

use crate::core::hierarchy::HierarchyIndex;
use crate::core::location::Location;
use crate::core::store::LocationTable;
use crate::core::types::{LocationId, LocationType};

use super::error::EngineError;

#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub table: LocationTable,
    pub index: HierarchyIndex,
    /// Bumped once per committed mutation
    pub version: u64,
}

impl State {
    pub fn record(&self, id: &LocationId) -> Result<&Location, EngineError> {
        self.table
            .get(id)
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    /// Type of `parent`, or `None` for the root group.
    pub fn parent_type(
        &self,
        parent: Option<&LocationId>,
    ) -> Result<Option<LocationType>, EngineError> {
        parent
            .map(|p| self.record(p).map(|r| r.location_type))
            .transpose()
    }

    /// Rewrite sibling `order_index` values for one group from the index.
    pub fn renumber(&mut self, parent: Option<&LocationId>) -> Vec<LocationId> {
        let group = self.index.children(parent).to_vec();
        self.table.renumber(&group)
    }

    /// Records in hierarchy order: depth-first, siblings by position.
    pub fn ordered_records(&self) -> Vec<Location> {
        self.index
            .walk()
            .into_iter()
            .filter_map(|(_, id)| self.table.get(&id).cloned())
            .collect()
    }

    /// Whether table and index agree (see module invariants).
    pub fn is_consistent(&self) -> bool {
        if self.table.len() != self.index.len() || !self.index.misplaced_entries().is_empty() {
            return false;
        }
        self.table.iter().all(|record| {
            self.index.parent(&record.id) == Some(record.parent_id.as_ref())
                && self.index.position(&record.id) == Some(record.order_index as usize)
        })
    }
}
