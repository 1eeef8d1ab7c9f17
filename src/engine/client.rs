//! engine::client
//!
//! A consumer-side view of the hierarchy: a cached snapshot plus the
//! version it was taken at.
//!
//! The client never edits its cache. When the change notifier reports a
//! newer commit, the next read re-fetches a whole snapshot from the
//! engine. Mutations go to the engine as single typed requests and the
//! cache is refreshed after each.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use spacetree::core::location::NewLocation;
//! use spacetree::engine::{Engine, EngineOptions, LocationClient};
//!
//! let engine = Arc::new(Engine::new(EngineOptions::default()));
//! let mut client = LocationClient::connect(Arc::clone(&engine)).unwrap();
//! assert_eq!(client.version(), 0);
//!
//! engine.create(NewLocation::new("Yard", "grounds")).unwrap();
//! assert!(client.is_stale());
//! assert_eq!(client.snapshot().unwrap().locations.len(), 1);
//! assert_eq!(client.version(), 1);
//! ```

use std::sync::Arc;

use tokio::sync::watch;

use super::{Engine, EngineError, MoveResult, Snapshot, TopologyChange};
use crate::core::types::LocationId;

/// Cached, version-stamped view of an engine.
#[derive(Debug)]
pub struct LocationClient {
    engine: Arc<Engine>,
    changes: watch::Receiver<TopologyChange>,
    cache: Snapshot,
}

impl LocationClient {
    /// Subscribe to `engine` and take an initial snapshot.
    pub fn connect(engine: Arc<Engine>) -> Result<Self, EngineError> {
        let changes = engine.subscribe();
        let cache = engine.snapshot()?;
        Ok(Self {
            engine,
            changes,
            cache,
        })
    }

    /// Version of the cached snapshot.
    pub fn version(&self) -> u64 {
        self.cache.version
    }

    /// Whether a commit has been announced since the last fetch.
    pub fn is_stale(&self) -> bool {
        self.changes.has_changed().unwrap_or(true)
    }

    /// The cached snapshot, without checking for staleness.
    pub fn cached(&self) -> &Snapshot {
        &self.cache
    }

    /// The current snapshot, re-fetched first if stale.
    pub fn snapshot(&mut self) -> Result<&Snapshot, EngineError> {
        if self.is_stale() {
            self.refresh()?;
        }
        Ok(&self.cache)
    }

    /// Re-fetch unconditionally.
    pub fn refresh(&mut self) -> Result<(), EngineError> {
        // Mark seen before fetching so a commit racing the fetch stays pending.
        let _ = self.changes.borrow_and_update();
        let snapshot = self.engine.snapshot()?;
        tracing::debug!(from = self.cache.version, to = snapshot.version, "client refreshed");
        self.cache = snapshot;
        Ok(())
    }

    /// Wait for the next commit, then refresh.
    pub async fn next_change(&mut self) -> Result<&Snapshot, EngineError> {
        // The engine owns the sender and we hold the engine, so this only
        // returns once a change is published.
        let _ = self.changes.changed().await;
        self.refresh()?;
        Ok(&self.cache)
    }

    /// Issue one move and refresh the cache.
    pub fn request_move(
        &mut self,
        id: &LocationId,
        new_parent: Option<&LocationId>,
        new_index: usize,
    ) -> Result<MoveResult, EngineError> {
        let result = self.engine.move_location(id, new_parent, new_index)?;
        self.refresh()?;
        Ok(result)
    }
}
