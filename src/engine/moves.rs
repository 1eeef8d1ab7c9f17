//! engine::moves
//!
//! The move algorithm: reparent and/or reorder one location.
//!
//! # Phases
//!
//! A move is split into a read-only [`check`] and an infallible
//! [`apply`]. The engine runs both under one write lock, so a rejected
//! move never touches state and an accepted one is never observed half
//! done.
//!
//! Preconditions, first failure wins:
//! 1. The location exists (`NotFound`)
//! 2. A non-root target parent exists (`NotFound`) and is neither the
//!    location nor one of its descendants (`WouldCreateCycle`)
//! 3. The type pairing is allowed (`InvalidHierarchy`)
//!
//! # Idempotence
//!
//! Removal from the old group tolerates absence and insertion drops any
//! stale occurrence in the target group, so repeating a move (or
//! retrying after a timeout) converges on the same tree with exactly one
//! entry per id.

use serde::Serialize;

use crate::core::rules::HierarchyRules;
use crate::core::types::LocationId;

use super::error::EngineError;
use super::state::State;

/// Outcome of a committed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub id: LocationId,
    pub old_parent: Option<LocationId>,
    pub new_parent: Option<LocationId>,
    /// Position actually used after clamping
    pub index: usize,
    pub is_explicit_root: bool,
    /// False when the move left the tree exactly as it was
    pub changed: bool,
    /// Records whose placement fields changed
    #[serde(skip)]
    pub(crate) affected: Vec<LocationId>,
}

/// Validate a move without touching state.
pub(crate) fn check(
    state: &State,
    rules: &HierarchyRules,
    id: &LocationId,
    new_parent: Option<&LocationId>,
) -> Result<(), EngineError> {
    let record = state.record(id)?;

    if let Some(target) = new_parent {
        state.record(target)?;
        if state.index.is_self_or_descendant(target, id) {
            return Err(EngineError::WouldCreateCycle {
                location: id.clone(),
                target: target.clone(),
            });
        }
    }

    let parent_type = state.parent_type(new_parent)?;
    rules.check(record.location_type, parent_type)?;
    Ok(())
}

/// Apply a move that [`check`] accepted.
pub(crate) fn apply(
    state: &mut State,
    id: &LocationId,
    new_parent: Option<LocationId>,
    new_index: usize,
) -> MoveResult {
    let old_position = state.index.position(id);
    let (old_parent, position) = state.index.relocate(id, new_parent.clone(), new_index);
    let old_parent = old_parent.flatten();

    let mut affected = Vec::new();
    let mut changed = old_parent != new_parent || old_position != Some(position);

    let promoted = new_parent.is_none();
    if let Some(record) = state.table.get_mut(id) {
        if record.parent_id != new_parent || record.is_explicit_root != promoted {
            changed = true;
            affected.push(id.clone());
        }
        record.parent_id = new_parent.clone();
        record.is_explicit_root = promoted;
    }

    if old_parent != new_parent {
        affected.extend(state.renumber(old_parent.as_ref()));
    }
    affected.extend(state.renumber(new_parent.as_ref()));
    affected.sort();
    affected.dedup();

    MoveResult {
        id: id.clone(),
        old_parent,
        new_parent,
        index: position,
        is_explicit_root: promoted,
        changed,
        affected,
    }
}
