//! engine
//!
//! The transactional façade over the location hierarchy.
//!
//! # Architecture
//!
//! An [`Engine`] owns the record table and the hierarchy index behind one
//! `parking_lot::RwLock`. Every operation follows the same shape:
//!
//! ```text
//! acquire lock (bounded) -> validate -> apply -> bump version -> release -> notify
//! ```
//!
//! Validation runs to completion before any mutation, and the mutation
//! steps are infallible, so a failed operation leaves no trace.
//!
//! # Concurrency
//!
//! - Mutations take the write lock for their whole duration
//! - Reads take a brief shared lock and return owned snapshots
//! - Lock waits are bounded; a timeout surfaces as [`EngineError::Busy`]
//! - Nothing is retried internally
//!
//! # Invariants
//!
//! - Exactly one index entry per existing location id
//! - The parent graph is acyclic
//! - Sibling `order_index` values are dense (`0..n`) after every commit
//! - Exactly one notification per committed mutation; rejected and
//!   no-op operations publish nothing
//!
//! # Example
//!
//! ```
//! use spacetree::core::location::NewLocation;
//! use spacetree::engine::{Engine, EngineOptions};
//!
//! let engine = Engine::new(EngineOptions::default());
//! let home = engine.create(NewLocation::new("Home", "building")).unwrap();
//! let floor = engine
//!     .create(NewLocation::new("Main Floor", "floor").under(home.id.clone()))
//!     .unwrap();
//! let kitchen = engine
//!     .create(NewLocation::new("Kitchen", "room").under(floor.id.clone()))
//!     .unwrap();
//!
//! let result = engine.move_location(&kitchen.id, None, 0).unwrap();
//! assert!(result.is_explicit_root);
//! assert_eq!(engine.snapshot().unwrap().version, 4);
//! ```

pub mod client;
pub mod error;
pub mod moves;
pub mod notify;
mod state;

pub use client::LocationClient;
pub use error::{EngineError, ErrorKind};
pub use moves::MoveResult;
pub use notify::{ChangeListener, Notifier, Operation, TopologyChange};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Serialize;
use tokio::sync::watch;

use crate::core::config::{Config, ConfigError, DEFAULT_LOCK_TIMEOUT_MS};
use crate::core::hierarchy::HierarchyIndex;
use crate::core::location::{normalize_name, parse_type, Location, LocationPatch, NewLocation};
use crate::core::modules::{self, ModuleKind, OccupancyDefaults, OccupancySource, SourceSpec};
use crate::core::registry::Registry;
use crate::core::rules::HierarchyRules;
use crate::core::store::{FileStore, LocationTable, StoreDocument, StoreError};
use crate::core::types::LocationId;
use crate::core::verify::{verify_records, VerifyIssue, VerifyResult};

use state::State;

/// Tunables for an engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub rules: HierarchyRules,
    pub occupancy: OccupancyDefaults,
    /// Bounded wait for the hierarchy lock
    pub lock_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            rules: HierarchyRules::default(),
            occupancy: OccupancyDefaults::default(),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: config.hierarchy_rules()?,
            occupancy: config.occupancy_defaults(),
            lock_timeout: config.lock_timeout(),
        })
    }
}

/// A consistent listing taken under one shared lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub version: u64,
    /// Records in hierarchy order: depth-first, siblings by position
    pub locations: Vec<Location>,
}

impl Snapshot {
    pub fn get(&self, id: &LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| &l.id == id)
    }

    /// Number of records carrying `id`.
    pub fn count(&self, id: &LocationId) -> usize {
        self.locations.iter().filter(|l| &l.id == id).count()
    }

    /// Members of a sibling group ordered by `order_index`.
    pub fn children(&self, parent: Option<&LocationId>) -> Vec<&Location> {
        let mut members: Vec<_> = self
            .locations
            .iter()
            .filter(|l| l.parent_id.as_ref() == parent)
            .collect();
        members.sort_by_key(|l| l.order_index);
        members
    }
}

/// Nested rendering model of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub location: Location,
    pub children: Vec<TreeNode>,
}

/// How [`Engine::delete`] treats a location with children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse with `HasChildren`
    #[default]
    LeafOnly,
    /// Remove the whole subtree
    Cascade,
}

/// Problems found while loading persisted state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Fixed by the load; saving persists the fix
    pub repaired: Vec<VerifyIssue>,
    /// Stored placements the configured rules would no longer allow
    pub outside_policy: Vec<VerifyIssue>,
}

/// The location hierarchy engine.
pub struct Engine {
    state: RwLock<State>,
    options: EngineOptions,
    registry: Option<Arc<dyn Registry>>,
    notifier: Notifier,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("registry", &self.registry.is_some())
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// An empty engine.
    pub fn new(options: EngineOptions) -> Self {
        Self::from_state(State::default(), options)
    }

    fn from_state(state: State, options: EngineOptions) -> Self {
        Self {
            notifier: Notifier::new(state.version),
            state: RwLock::new(state),
            options,
            registry: None,
        }
    }

    /// Validate area and entity references against `registry`.
    pub fn with_registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // =========================================================================
    // Loading and persistence
    // =========================================================================

    /// Build an engine from persisted records.
    ///
    /// The records are verified first. Recoverable problems (colliding or
    /// sparse sibling order, stale root flags) are repaired by a full index
    /// rebuild and renumbering, and listed in the returned report.
    /// Placements that only the tightened rules forbid are kept as stored
    /// and listed separately, so they can still be moved.
    ///
    /// # Errors
    ///
    /// [`EngineError::CorruptState`] for duplicate ids, dangling parents,
    /// cycles, or pairings the structural type table forbids.
    pub fn from_records(
        records: Vec<Location>,
        options: EngineOptions,
    ) -> Result<(Self, LoadReport), EngineError> {
        let result = verify_records(&records, &options.rules);
        if !result.is_recoverable() {
            let details = result
                .irreconcilable()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(%details, "refusing corrupt hierarchy");
            return Err(EngineError::CorruptState(details));
        }

        let table: LocationTable = records.into_iter().collect();
        let index = HierarchyIndex::rebuild(
            table
                .iter()
                .map(|r| (r.id.clone(), r.parent_id.clone(), r.order_index)),
        )
        .map_err(|e| EngineError::CorruptState(e.to_string()))?;

        let mut state = State {
            table,
            index,
            version: 0,
        };

        let (repaired, outside_policy): (Vec<_>, Vec<_>) = result
            .issues
            .into_iter()
            .partition(VerifyIssue::is_recoverable);
        if !repaired.is_empty() {
            tracing::info!(issues = repaired.len(), "rebuilt hierarchy index on load");
            repair(&mut state);
        }
        if !outside_policy.is_empty() {
            tracing::warn!(
                locations = outside_policy.len(),
                "stored placements violate configured hierarchy rules"
            );
        }

        let report = LoadReport {
            repaired,
            outside_policy,
        };
        Ok((Self::from_state(state, options), report))
    }

    /// Build an engine from a parsed store document.
    pub fn from_document(
        doc: StoreDocument,
        options: EngineOptions,
    ) -> Result<(Self, LoadReport), EngineError> {
        doc.verify_fingerprint().map_err(corrupt_or_persistence)?;
        Self::from_records(doc.locations, options)
    }

    /// Load from a file store; an empty store yields an empty engine.
    ///
    /// The caller is expected to hold the store lock if it intends to save.
    pub fn open(store: &FileStore, options: EngineOptions) -> Result<(Self, LoadReport), EngineError> {
        match store.load().map_err(corrupt_or_persistence)? {
            Some(doc) => Self::from_document(doc, options),
            None => Ok((Self::new(options), LoadReport::default())),
        }
    }

    /// The persisted document for the current state.
    pub fn export(&self) -> Result<StoreDocument, EngineError> {
        let records = self.read()?.table.list();
        Ok(StoreDocument::from_locations(records)?)
    }

    /// Export and write to `store`.
    pub fn save(&self, store: &FileStore) -> Result<(), EngineError> {
        let doc = self.export()?;
        store.save(&doc)?;
        Ok(())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Subscribe to committed changes.
    pub fn subscribe(&self) -> watch::Receiver<TopologyChange> {
        self.notifier.subscribe()
    }

    pub fn add_listener(&self, listener: Arc<dyn ChangeListener>) {
        self.notifier.add_listener(listener);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn version(&self) -> Result<u64, EngineError> {
        Ok(self.read()?.version)
    }

    pub fn get(&self, id: &LocationId) -> Result<Location, EngineError> {
        self.read()?.record(id).cloned()
    }

    /// All locations in hierarchy order.
    pub fn list(&self) -> Result<Vec<Location>, EngineError> {
        Ok(self.read()?.ordered_records())
    }

    pub fn snapshot(&self) -> Result<Snapshot, EngineError> {
        let state = self.read()?;
        Ok(Snapshot {
            version: state.version,
            locations: state.ordered_records(),
        })
    }

    /// Ordered child ids of `parent` (`None` = roots).
    pub fn children(&self, parent: Option<&LocationId>) -> Result<Vec<LocationId>, EngineError> {
        let state = self.read()?;
        if let Some(p) = parent {
            state.record(p)?;
        }
        Ok(state.index.children(parent).to_vec())
    }

    /// Nested tree of all locations.
    pub fn tree(&self) -> Result<Vec<TreeNode>, EngineError> {
        let state = self.read()?;
        Ok(build_tree(&state, None))
    }

    /// Ids from the root down to `id`, inclusive.
    pub fn path(&self, id: &LocationId) -> Result<Vec<LocationId>, EngineError> {
        let state = self.read()?;
        state.record(id)?;
        let mut path = state.index.ancestors(id);
        path.reverse();
        path.push(id.clone());
        Ok(path)
    }

    /// Verify the current records against the structural invariants.
    pub fn verify(&self) -> Result<VerifyResult, EngineError> {
        let records = self.read()?.table.list();
        Ok(verify_records(&records, &self.options.rules))
    }

    // =========================================================================
    // Location store operations
    // =========================================================================

    /// Create a location at the end of its parent's sibling group.
    ///
    /// # Errors
    ///
    /// `InvalidType`, `InvalidName`, `UnknownArea`, `DuplicateId`,
    /// `NotFound` (parent), `InvalidHierarchy`, `Busy`.
    pub fn create(&self, fields: NewLocation) -> Result<Location, EngineError> {
        let location_type = parse_type(&fields.location_type)?;
        let name = normalize_name(&fields.name)
            .ok_or_else(|| EngineError::InvalidName(fields.name.clone()))?;
        if let Some(area) = &fields.ha_area_id {
            self.check_area(area)?;
        }

        self.commit(Operation::Create, |state| {
            let id = match fields.id {
                Some(id) if state.table.contains(&id) => return Err(EngineError::DuplicateId(id)),
                Some(id) => id,
                None => loop {
                    let candidate = LocationId::generate();
                    if !state.table.contains(&candidate) {
                        break candidate;
                    }
                },
            };

            let parent_type = state.parent_type(fields.parent_id.as_ref())?;
            self.options.rules.check(location_type, parent_type)?;

            let position = state.index.children(fields.parent_id.as_ref()).len();
            let location = Location {
                id: id.clone(),
                name,
                location_type,
                parent_id: fields.parent_id.clone(),
                is_explicit_root: false,
                ha_area_id: fields.ha_area_id,
                order_index: position as u32,
                modules: Default::default(),
            };
            if let Err(rejected) = state.table.insert(location.clone()) {
                return Err(EngineError::DuplicateId(rejected.id));
            }
            state.index.insert(id.clone(), fields.parent_id);

            Ok((location, vec![id]))
        })
    }

    /// Apply a field patch.
    ///
    /// A type change is checked against the current parent and every
    /// current child. An empty or no-op patch commits nothing.
    pub fn update_fields(
        &self,
        id: &LocationId,
        patch: LocationPatch,
    ) -> Result<Location, EngineError> {
        let name = patch
            .name
            .as_deref()
            .map(|n| normalize_name(n).ok_or_else(|| EngineError::InvalidName(n.to_string())))
            .transpose()?;
        let new_type = patch.location_type.as_deref().map(parse_type).transpose()?;
        if let Some(Some(area)) = &patch.ha_area_id {
            self.check_area(area)?;
        }

        self.commit(Operation::Update, |state| {
            let record = state.record(id)?;

            if let Some(new_type) = new_type.filter(|t| *t != record.location_type) {
                let parent_type = state.parent_type(record.parent_id.as_ref())?;
                self.options.rules.check(new_type, parent_type)?;
                for child in state.index.children(Some(id)) {
                    let child_type = state.record(child)?.location_type;
                    self.options.rules.check(child_type, Some(new_type))?;
                }
            }

            let mut updated = record.clone();
            if let Some(name) = name {
                updated.name = name;
            }
            if let Some(area) = patch.ha_area_id {
                updated.ha_area_id = area;
            }
            if let Some(new_type) = new_type {
                updated.location_type = new_type;
            }

            if &updated == record {
                return Ok((updated, Vec::new()));
            }
            if let Some(slot) = state.table.get_mut(id) {
                *slot = updated.clone();
            }
            Ok((updated, vec![id.clone()]))
        })
    }

    /// Delete a location.
    ///
    /// Returns the removed ids, the location itself first. Module
    /// configuration goes with its location.
    ///
    /// # Errors
    ///
    /// `NotFound`, `HasChildren` under [`DeletePolicy::LeafOnly`], `Busy`.
    pub fn delete(
        &self,
        id: &LocationId,
        policy: DeletePolicy,
    ) -> Result<Vec<LocationId>, EngineError> {
        self.commit(Operation::Delete, |state| {
            state.record(id)?;

            let count = state.table.child_count(id);
            if count > 0 && policy == DeletePolicy::LeafOnly {
                return Err(EngineError::HasChildren {
                    id: id.clone(),
                    count,
                });
            }

            let descendants = state.index.descendants(id);
            let parent = state.index.parent(id).flatten().cloned();

            for child in descendants.iter().rev() {
                state.index.remove(child);
                state.table.remove(child);
            }
            state.index.remove(id);
            state.table.remove(id);

            let mut removed = vec![id.clone()];
            removed.extend(descendants);
            let mut affected = removed.clone();
            affected.extend(state.renumber(parent.as_ref()));

            Ok((removed, affected))
        })
    }

    // =========================================================================
    // Move engine
    // =========================================================================

    /// Move a location under `new_parent` (`None` = root) at `new_index`.
    ///
    /// `new_index` is clamped to the target group. Repeating a move is a
    /// no-op that commits nothing.
    ///
    /// # Errors
    ///
    /// `NotFound`, `WouldCreateCycle`, `InvalidHierarchy`, `Busy`.
    pub fn move_location(
        &self,
        id: &LocationId,
        new_parent: Option<&LocationId>,
        new_index: usize,
    ) -> Result<MoveResult, EngineError> {
        self.commit(Operation::Move, |state| {
            moves::check(state, &self.options.rules, id, new_parent)?;
            let result = moves::apply(state, id, new_parent.cloned(), new_index);
            Ok(move_outcome(result))
        })
    }

    /// Move a location within its current sibling group.
    pub fn reorder(&self, id: &LocationId, new_index: usize) -> Result<MoveResult, EngineError> {
        self.commit(Operation::Move, |state| {
            let parent = state.record(id)?.parent_id.clone();
            moves::check(state, &self.options.rules, id, parent.as_ref())?;
            let result = moves::apply(state, id, parent, new_index);
            Ok(move_outcome(result))
        })
    }

    // =========================================================================
    // Module attachment
    // =========================================================================

    /// Attach a source to a location's module, applying defaults.
    ///
    /// # Errors
    ///
    /// `NotFound`, `UnknownModule`, `InvalidMode`, `InvalidEntityId`,
    /// `UnknownEntity`, `DuplicateSource`, `Busy`.
    pub fn attach_source(
        &self,
        id: &LocationId,
        module: &str,
        spec: SourceSpec,
    ) -> Result<OccupancySource, EngineError> {
        self.commit(Operation::Attach, |state| {
            state.record(id)?;
            let kind = parse_module(id, module)?;
            let source = spec
                .resolve(&self.options.occupancy)
                .map_err(|e| EngineError::from_module(id, e))?;
            self.check_entity(&source.entity_id)?;

            let record = state
                .table
                .get_mut(id)
                .ok_or_else(|| EngineError::NotFound(id.clone()))?;
            modules::attach(&mut record.modules, kind, source.clone())
                .map_err(|e| EngineError::from_module(id, e))?;

            Ok((source, vec![id.clone()]))
        })
    }

    /// Remove a source from a location's module.
    ///
    /// # Errors
    ///
    /// `NotFound`, `UnknownModule`, `SourceNotFound`, `Busy`.
    pub fn remove_source(
        &self,
        id: &LocationId,
        module: &str,
        entity_id: &str,
    ) -> Result<OccupancySource, EngineError> {
        self.commit(Operation::Detach, |state| {
            state.record(id)?;
            let kind = parse_module(id, module)?;
            let record = state
                .table
                .get_mut(id)
                .ok_or_else(|| EngineError::NotFound(id.clone()))?;
            let removed = modules::remove(&mut record.modules, kind, entity_id)
                .map_err(|e| EngineError::from_module(id, e))?;

            Ok((removed, vec![id.clone()]))
        })
    }

    /// Sources attached to a location's module, in attachment order.
    pub fn list_sources(
        &self,
        id: &LocationId,
        module: &str,
    ) -> Result<Vec<OccupancySource>, EngineError> {
        let state = self.read()?;
        let record = state.record(id)?;
        let kind = parse_module(id, module)?;
        Ok(modules::sources(&record.modules, kind))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn busy(&self) -> EngineError {
        tracing::warn!(
            timeout_ms = self.options.lock_timeout.as_millis() as u64,
            "hierarchy lock busy"
        );
        EngineError::Busy {
            timeout: self.options.lock_timeout,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, EngineError> {
        self.state
            .try_read_for(self.options.lock_timeout)
            .ok_or_else(|| self.busy())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, EngineError> {
        self.state
            .try_write_for(self.options.lock_timeout)
            .ok_or_else(|| self.busy())
    }

    /// Run one mutation under the write lock.
    ///
    /// `apply` returns its value and the affected ids. It must not mutate
    /// state before its last fallible step. An empty affected list means
    /// nothing changed: the version stays put and nothing is published.
    fn commit<T>(
        &self,
        operation: Operation,
        apply: impl FnOnce(&mut State) -> Result<(T, Vec<LocationId>), EngineError>,
    ) -> Result<T, EngineError> {
        let mut state = self.write()?;
        let (value, affected) = apply(&mut state)?;
        if affected.is_empty() {
            tracing::debug!(%operation, "no-op");
            return Ok(value);
        }

        state.version += 1;
        debug_assert!(state.is_consistent(), "{operation} left table and index out of sync");
        let change = TopologyChange {
            version: state.version,
            operation,
            affected,
        };
        drop(state);

        tracing::debug!(
            %operation,
            version = change.version,
            affected = change.affected.len(),
            "committed"
        );
        self.notifier.publish(change);
        Ok(value)
    }

    fn check_area(&self, area: &str) -> Result<(), EngineError> {
        match &self.registry {
            Some(registry) if !registry.area_exists(area) => {
                Err(EngineError::UnknownArea(area.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_entity(&self, entity_id: &str) -> Result<(), EngineError> {
        match &self.registry {
            Some(registry) if !registry.entity_exists(entity_id) => {
                Err(EngineError::UnknownEntity(entity_id.to_string()))
            }
            _ => Ok(()),
        }
    }
}

fn parse_module(id: &LocationId, module: &str) -> Result<ModuleKind, EngineError> {
    module
        .parse()
        .map_err(|e| EngineError::from_module(id, e))
}

fn move_outcome(result: MoveResult) -> (MoveResult, Vec<LocationId>) {
    let mut affected = result.affected.clone();
    if result.changed && affected.is_empty() {
        affected.push(result.id.clone());
    }
    if !result.changed {
        affected.clear();
    }
    (result, affected)
}

fn corrupt_or_persistence(err: StoreError) -> EngineError {
    match err {
        StoreError::FingerprintMismatch { .. } => EngineError::CorruptState(err.to_string()),
        other => EngineError::Persistence(other),
    }
}

/// Renumber every sibling group and clear stale root flags.
fn repair(state: &mut State) {
    let groups: Vec<Option<LocationId>> = std::iter::once(None)
        .chain(state.table.iter().map(|r| Some(r.id.clone())))
        .collect();
    for parent in &groups {
        state.renumber(parent.as_ref());
    }

    let stale: Vec<LocationId> = state
        .table
        .iter()
        .filter(|r| r.parent_id.is_some() && r.is_explicit_root)
        .map(|r| r.id.clone())
        .collect();
    for id in stale {
        if let Some(record) = state.table.get_mut(&id) {
            record.is_explicit_root = false;
        }
    }
}

fn build_tree(state: &State, parent: Option<&LocationId>) -> Vec<TreeNode> {
    state
        .index
        .children(parent)
        .iter()
        .filter_map(|id| {
            state.table.get(id).map(|location| TreeNode {
                location: location.clone(),
                children: build_tree(state, Some(id)),
            })
        })
        .collect()
}
