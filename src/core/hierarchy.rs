//! core::hierarchy
//!
//! Hierarchy index: parent pointers plus ordered child lists.
//!
//! # Architecture
//!
//! The index is derived from the location records and maintained
//! incrementally as records change:
//! - Every indexed id has exactly one parent entry (`None` = root)
//! - Every indexed id appears in exactly one ordered sibling group
//! - The root group is an ordinary sibling group
//!
//! A full rebuild ([`HierarchyIndex::rebuild`]) is reserved for loading
//! persisted state and recovering from detected corruption.
//!
//! # Invariants
//!
//! - No id appears twice across all sibling groups
//! - The parent graph is acyclic (checked by callers before relocating)

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use super::types::LocationId;

/// Errors from rebuilding an index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("location id appears more than once: {0}")]
    DuplicateId(LocationId),
}

/// Ordered parent/child index over location ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HierarchyIndex {
    /// Parent pointer for each indexed location
    parents: HashMap<LocationId, Option<LocationId>>,
    /// Ordered root group
    roots: Vec<LocationId>,
    /// Ordered child groups keyed by parent
    children: HashMap<LocationId, Vec<LocationId>>,
}

impl HierarchyIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from `(id, parent, order_index)` triples.
    ///
    /// Siblings are ordered by `order_index`, ties broken by id so the
    /// result is deterministic even when stored indexes collide.
    ///
    /// # Errors
    ///
    /// [`IndexError::DuplicateId`] if an id appears twice.
    ///
    /// # Example
    ///
    /// ```
    /// use spacetree::core::hierarchy::HierarchyIndex;
    /// use spacetree::core::types::LocationId;
    ///
    /// let floor = LocationId::new("main-floor").unwrap();
    /// let kitchen = LocationId::new("kitchen").unwrap();
    /// let living = LocationId::new("living-room").unwrap();
    ///
    /// let index = HierarchyIndex::rebuild(vec![
    ///     (floor.clone(), None, 0),
    ///     (living.clone(), Some(floor.clone()), 1),
    ///     (kitchen.clone(), Some(floor.clone()), 0),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(index.children(Some(&floor)), &[kitchen, living]);
    /// ```
    pub fn rebuild<I>(entries: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (LocationId, Option<LocationId>, u32)>,
    {
        let mut index = Self::new();
        let mut groups: HashMap<Option<LocationId>, Vec<(u32, LocationId)>> = HashMap::new();

        for (id, parent, order) in entries {
            if index.parents.insert(id.clone(), parent.clone()).is_some() {
                return Err(IndexError::DuplicateId(id));
            }
            groups.entry(parent).or_default().push((order, id));
        }

        for (parent, mut members) in groups {
            members.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            let ordered: Vec<_> = members.into_iter().map(|(_, id)| id).collect();
            match parent {
                None => index.roots = ordered,
                Some(p) => {
                    index.children.insert(p, ordered);
                }
            }
        }

        Ok(index)
    }

    /// Number of indexed locations.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Whether `id` is indexed.
    pub fn contains(&self, id: &LocationId) -> bool {
        self.parents.contains_key(id)
    }

    /// Parent of `id`: `None` if not indexed, `Some(None)` for a root.
    pub fn parent(&self, id: &LocationId) -> Option<Option<&LocationId>> {
        self.parents.get(id).map(Option::as_ref)
    }

    /// Ordered members of a sibling group (`None` = root group).
    pub fn children(&self, parent: Option<&LocationId>) -> &[LocationId] {
        match parent {
            None => &self.roots,
            Some(p) => self.children.get(p).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Position of `id` within its sibling group.
    pub fn position(&self, id: &LocationId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| c == id)
    }

    fn group_mut(&mut self, parent: Option<&LocationId>) -> &mut Vec<LocationId> {
        match parent {
            None => &mut self.roots,
            Some(p) => self.children.entry(p.clone()).or_default(),
        }
    }

    fn prune_group(&mut self, parent: Option<&LocationId>) {
        if let Some(p) = parent {
            if self.children.get(p).is_some_and(Vec::is_empty) {
                self.children.remove(p);
            }
        }
    }

    /// Append a new id at the end of its parent's group.
    ///
    /// Returns the position it was placed at.
    pub fn insert(&mut self, id: LocationId, parent: Option<LocationId>) -> usize {
        let len = self.children(parent.as_ref()).len();
        self.relocate(&id, parent, len).1
    }

    /// Move `id` into `new_parent`'s group at `index`.
    ///
    /// Removing `id` from its previous group is idempotent. `index` is
    /// clamped to the target group's length after that removal. Any
    /// stale occurrence of `id` in the target group is dropped before
    /// inserting, so the id ends up in exactly one place.
    ///
    /// Returns the previous parent (`None` if `id` was not indexed) and the
    /// position actually used.
    pub fn relocate(
        &mut self,
        id: &LocationId,
        new_parent: Option<LocationId>,
        index: usize,
    ) -> (Option<Option<LocationId>>, usize) {
        let old_parent = self.parents.get(id).cloned();

        if let Some(old) = &old_parent {
            self.group_mut(old.as_ref()).retain(|c| c != id);
        }

        let group = self.group_mut(new_parent.as_ref());
        let stale = group.iter().filter(|c| *c == id).count();
        if stale > 0 {
            tracing::warn!(location = %id, stale, "dropping stale sibling entries");
            group.retain(|c| c != id);
        }
        let position = index.min(group.len());
        group.insert(position, id.clone());

        self.parents.insert(id.clone(), new_parent);
        if let Some(old) = &old_parent {
            self.prune_group(old.as_ref());
        }

        (old_parent, position)
    }

    /// Remove `id` from the index.
    ///
    /// Children of `id` are not touched; callers remove leaves first.
    /// Returns the previous parent, or `None` if `id` was not indexed.
    pub fn remove(&mut self, id: &LocationId) -> Option<Option<LocationId>> {
        let old_parent = self.parents.remove(id)?;
        self.group_mut(old_parent.as_ref()).retain(|c| c != id);
        self.prune_group(old_parent.as_ref());
        self.children.remove(id);
        Some(old_parent)
    }

    /// Check if the parent graph contains a cycle.
    ///
    /// Returns `Some(id)` for a location on a cycle.
    pub fn find_cycle(&self) -> Option<LocationId> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        let mut ids: Vec<_> = self.parents.keys().collect();
        ids.sort();
        for id in ids {
            if self.has_cycle_from(id, &mut visited, &mut path) {
                return Some(id.clone());
            }
        }
        None
    }

    fn has_cycle_from(
        &self,
        id: &LocationId,
        visited: &mut HashSet<LocationId>,
        path: &mut HashSet<LocationId>,
    ) -> bool {
        if path.contains(id) {
            return true;
        }
        if visited.contains(id) {
            return false;
        }

        visited.insert(id.clone());
        path.insert(id.clone());

        if let Some(Some(parent)) = self.parents.get(id) {
            if self.has_cycle_from(parent, visited, path) {
                return true;
            }
        }

        path.remove(id);
        false
    }

    /// All descendants of `id`, breadth-first in sibling order.
    pub fn descendants(&self, id: &LocationId) -> Vec<LocationId> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<_> = self.children(Some(id)).iter().cloned().collect();

        while let Some(current) = queue.pop_front() {
            if seen.insert(current.clone()) {
                queue.extend(self.children(Some(&current)).iter().cloned());
                result.push(current);
            }
        }

        result
    }

    /// Whether `candidate` is `id` itself or one of its descendants.
    ///
    /// Walks up from `candidate`, so the cost is bounded by depth.
    pub fn is_self_or_descendant(&self, candidate: &LocationId, id: &LocationId) -> bool {
        if candidate == id {
            return true;
        }
        self.ancestors(candidate).iter().any(|a| a == id)
    }

    /// Ancestors of `id`, from immediate parent to root.
    ///
    /// Stops early if a cycle is encountered.
    pub fn ancestors(&self, id: &LocationId) -> Vec<LocationId> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.parent(id).flatten();

        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            result.push(parent.clone());
            current = self.parent(parent).flatten();
        }

        result
    }

    /// Ids listed in sibling groups more than once, or in a group that
    /// disagrees with their parent pointer.
    ///
    /// Empty for a healthy index.
    pub fn misplaced_entries(&self) -> Vec<LocationId> {
        let mut counts: HashMap<&LocationId, usize> = HashMap::new();
        let mut misplaced = Vec::new();

        let groups = std::iter::once((None, &self.roots))
            .chain(self.children.iter().map(|(p, v)| (Some(p), v)));
        for (parent, members) in groups {
            for member in members {
                *counts.entry(member).or_default() += 1;
                if self.parents.get(member).map(Option::as_ref) != Some(parent) {
                    misplaced.push(member.clone());
                }
            }
        }

        misplaced.extend(
            counts
                .into_iter()
                .filter(|(_, n)| *n > 1)
                .map(|(id, _)| id.clone()),
        );
        misplaced.sort();
        misplaced.dedup();
        misplaced
    }

    /// Depth-first traversal in sibling order, yielding `(depth, id)`.
    pub fn walk(&self) -> Vec<(usize, LocationId)> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack: Vec<(usize, &LocationId)> =
            self.roots.iter().rev().map(|id| (0, id)).collect();
        let mut seen = HashSet::new();

        while let Some((depth, id)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push((depth, id.clone()));
            for child in self.children(Some(id)).iter().rev() {
                stack.push((depth + 1, child));
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LocationId {
        LocationId::new(s).unwrap()
    }

    /// main-floor -> [kitchen, living-room], second-floor -> [bedroom]
    fn sample() -> HierarchyIndex {
        HierarchyIndex::rebuild(vec![
            (id("house"), None, 0),
            (id("main-floor"), Some(id("house")), 0),
            (id("second-floor"), Some(id("house")), 1),
            (id("kitchen"), Some(id("main-floor")), 0),
            (id("living-room"), Some(id("main-floor")), 1),
            (id("bedroom"), Some(id("second-floor")), 0),
        ])
        .unwrap()
    }

    #[test]
    fn empty_index_has_no_cycles() {
        let index = HierarchyIndex::new();
        assert!(index.find_cycle().is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn rebuild_orders_siblings() {
        let index = sample();
        assert_eq!(
            index.children(Some(&id("main-floor"))),
            &[id("kitchen"), id("living-room")]
        );
        assert_eq!(index.children(None), &[id("house")]);
        assert_eq!(index.len(), 6);
    }

    #[test]
    fn rebuild_breaks_order_ties_by_id() {
        let index = HierarchyIndex::rebuild(vec![
            (id("b"), None, 0),
            (id("a"), None, 0),
            (id("c"), None, 0),
        ])
        .unwrap();
        assert_eq!(index.children(None), &[id("a"), id("b"), id("c")]);
    }

    #[test]
    fn rebuild_rejects_duplicate_ids() {
        let err = HierarchyIndex::rebuild(vec![(id("a"), None, 0), (id("a"), None, 1)]).unwrap_err();
        assert_eq!(err, IndexError::DuplicateId(id("a")));
    }

    #[test]
    fn relocate_across_groups() {
        let mut index = sample();
        let (old, pos) = index.relocate(&id("kitchen"), Some(id("second-floor")), 0);

        assert_eq!(old, Some(Some(id("main-floor"))));
        assert_eq!(pos, 0);
        assert_eq!(
            index.children(Some(&id("second-floor"))),
            &[id("kitchen"), id("bedroom")]
        );
        assert_eq!(index.children(Some(&id("main-floor"))), &[id("living-room")]);
        assert!(index.misplaced_entries().is_empty());
    }

    #[test]
    fn relocate_clamps_index() {
        let mut index = sample();
        let (_, pos) = index.relocate(&id("kitchen"), Some(id("second-floor")), 99);
        assert_eq!(pos, 1);
        assert_eq!(
            index.children(Some(&id("second-floor"))),
            &[id("bedroom"), id("kitchen")]
        );
    }

    #[test]
    fn relocate_within_group_reorders() {
        let mut index = sample();
        index.relocate(&id("kitchen"), Some(id("main-floor")), 1);
        assert_eq!(
            index.children(Some(&id("main-floor"))),
            &[id("living-room"), id("kitchen")]
        );
    }

    #[test]
    fn repeated_relocate_is_stable() {
        let mut index = sample();
        index.relocate(&id("kitchen"), None, 0);
        let once = index.clone();
        index.relocate(&id("kitchen"), None, 0);
        assert_eq!(index, once);
        assert_eq!(index.children(None), &[id("kitchen"), id("house")]);
    }

    #[test]
    fn relocate_drops_stale_target_entries() {
        let mut index = sample();
        // Corrupt: kitchen also listed under second-floor.
        index
            .children
            .entry(id("second-floor"))
            .or_default()
            .push(id("kitchen"));
        assert!(!index.misplaced_entries().is_empty());

        index.relocate(&id("kitchen"), Some(id("second-floor")), 0);

        let second = index.children(Some(&id("second-floor")));
        assert_eq!(second.iter().filter(|c| **c == id("kitchen")).count(), 1);
        assert!(index.misplaced_entries().is_empty());
    }

    #[test]
    fn remove_leaf() {
        let mut index = sample();
        let old = index.remove(&id("bedroom"));
        assert_eq!(old, Some(Some(id("second-floor"))));
        assert!(index.children(Some(&id("second-floor"))).is_empty());
        assert!(!index.contains(&id("bedroom")));
        assert_eq!(index.remove(&id("bedroom")), None);
    }

    #[test]
    fn descendants_in_breadth_first_order() {
        let index = sample();
        assert_eq!(
            index.descendants(&id("house")),
            vec![
                id("main-floor"),
                id("second-floor"),
                id("kitchen"),
                id("living-room"),
                id("bedroom")
            ]
        );
        assert!(index.descendants(&id("kitchen")).is_empty());
    }

    #[test]
    fn ancestors_returns_chain_in_order() {
        let index = sample();
        assert_eq!(
            index.ancestors(&id("kitchen")),
            vec![id("main-floor"), id("house")]
        );
        assert!(index.ancestors(&id("house")).is_empty());
    }

    #[test]
    fn self_or_descendant() {
        let index = sample();
        assert!(index.is_self_or_descendant(&id("kitchen"), &id("house")));
        assert!(index.is_self_or_descendant(&id("house"), &id("house")));
        assert!(!index.is_self_or_descendant(&id("house"), &id("kitchen")));
        assert!(!index.is_self_or_descendant(&id("bedroom"), &id("main-floor")));
    }

    #[test]
    fn cycle_detected_after_rebuild() {
        let index = HierarchyIndex::rebuild(vec![
            (id("a"), Some(id("b")), 0),
            (id("b"), Some(id("a")), 0),
        ])
        .unwrap();
        assert!(index.find_cycle().is_some());
        assert_eq!(index.ancestors(&id("a")), vec![id("b"), id("a")]);
    }

    #[test]
    fn walk_is_depth_first_in_sibling_order() {
        let index = sample();
        let walked: Vec<_> = index
            .walk()
            .into_iter()
            .map(|(d, i)| (d, i.to_string()))
            .collect();
        assert_eq!(
            walked,
            vec![
                (0, "house".to_string()),
                (1, "main-floor".to_string()),
                (2, "kitchen".to_string()),
                (2, "living-room".to_string()),
                (1, "second-floor".to_string()),
                (2, "bedroom".to_string()),
            ]
        );
    }
}
