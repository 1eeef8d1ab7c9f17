//! core::store::table
//!
//! The authoritative in-memory table of location records.
//!
//! The table owns identity and raw field storage only. It does not know
//! about sibling order semantics or type rules; the engine validates a
//! transition completely before touching the table, so every mutation
//! here is infallible apart from identity conflicts.

use std::collections::BTreeMap;

use crate::core::location::Location;
use crate::core::types::LocationId;

/// Location records keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationTable {
    records: BTreeMap<LocationId, Location>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. Returns the record back if the id is taken.
    pub fn insert(&mut self, location: Location) -> Result<(), Location> {
        if self.records.contains_key(&location.id) {
            return Err(location);
        }
        self.records.insert(location.id.clone(), location);
        Ok(())
    }

    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &LocationId) -> Option<&mut Location> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.records.contains_key(id)
    }

    pub fn remove(&mut self, id: &LocationId) -> Option<Location> {
        self.records.remove(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.records.values()
    }

    /// Number of records whose parent is `id`.
    ///
    /// Scans the records directly so it does not depend on the index
    /// being healthy.
    pub fn child_count(&self, id: &LocationId) -> usize {
        self.records
            .values()
            .filter(|l| l.parent_id.as_ref() == Some(id))
            .count()
    }

    /// Snapshot of all records, ordered by id.
    pub fn list(&self) -> Vec<Location> {
        self.records.values().cloned().collect()
    }

    /// Rewrite `order_index` to match positions in `group`.
    ///
    /// Returns the ids whose index actually changed.
    pub(crate) fn renumber(&mut self, group: &[LocationId]) -> Vec<LocationId> {
        let mut changed = Vec::new();
        for (position, id) in group.iter().enumerate() {
            if let Some(record) = self.records.get_mut(id) {
                if record.order_index != position as u32 {
                    record.order_index = position as u32;
                    changed.push(id.clone());
                }
            }
        }
        changed
    }
}

impl FromIterator<Location> for LocationTable {
    /// Later records with a repeated id replace earlier ones; callers that
    /// must detect duplicates check before collecting.
    fn from_iter<T: IntoIterator<Item = Location>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().map(|l| (l.id.clone(), l)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::modules::Modules;
    use crate::core::types::LocationType;

    fn location(id: &str, parent: Option<&str>) -> Location {
        Location {
            id: LocationId::new(id).unwrap(),
            name: id.into(),
            location_type: LocationType::Room,
            parent_id: parent.map(|p| LocationId::new(p).unwrap()),
            is_explicit_root: false,
            ha_area_id: None,
            order_index: 9,
            modules: Modules::new(),
        }
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut table = LocationTable::new();
        table.insert(location("kitchen", None)).unwrap();
        let rejected = table.insert(location("kitchen", Some("x"))).unwrap_err();
        assert_eq!(rejected.parent_id.unwrap().as_str(), "x");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn child_count_scans_parents() {
        let table: LocationTable = vec![
            location("floor", None),
            location("a", Some("floor")),
            location("b", Some("floor")),
        ]
        .into_iter()
        .collect();
        assert_eq!(table.child_count(&LocationId::new("floor").unwrap()), 2);
        assert_eq!(table.child_count(&LocationId::new("a").unwrap()), 0);
    }

    #[test]
    fn renumber_densifies() {
        let mut table: LocationTable = vec![location("a", None), location("b", None)]
            .into_iter()
            .collect();
        let group = vec![LocationId::new("b").unwrap(), LocationId::new("a").unwrap()];
        assert_eq!(table.renumber(&group).len(), 2);
        assert_eq!(table.get(&group[0]).unwrap().order_index, 0);
        assert_eq!(table.get(&group[1]).unwrap().order_index, 1);
        assert!(table.renumber(&group).is_empty());
    }
}
