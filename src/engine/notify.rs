//! engine::notify
//!
//! Change notifier: one signal per committed mutation.
//!
//! # Delivery
//!
//! Two channels carry the same [`TopologyChange`]:
//! - A `tokio::sync::watch` channel. It coalesces: a slow subscriber
//!   always observes the latest version, never a stale one, and never
//!   misses the fact that something changed.
//! - Synchronous [`ChangeListener`]s, invoked in registration order.
//!
//! Both are fed by the engine after its state lock has been released.
//! Notifications are invalidation signals. Consumers re-query the engine
//! for the current state instead of applying the change themselves.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::core::types::LocationId;

/// The kind of operation that produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// State loaded; no mutation yet
    Loaded,
    Create,
    Update,
    Move,
    Delete,
    Attach,
    Detach,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Loaded => "loaded",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Move => "move",
            Operation::Delete => "delete",
            Operation::Attach => "attach",
            Operation::Detach => "detach",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed change to the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyChange {
    /// Engine version after the change
    pub version: u64,
    pub operation: Operation,
    /// Locations whose records changed, including removed ones
    pub affected: Vec<LocationId>,
}

impl TopologyChange {
    pub(crate) fn loaded(version: u64) -> Self {
        Self {
            version,
            operation: Operation::Loaded,
            affected: Vec::new(),
        }
    }
}

/// Receives committed changes synchronously.
///
/// Called outside the engine lock, so a listener may call back into the
/// engine. It should return quickly; the mutating caller waits for it.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self, change: &TopologyChange);
}

impl<F> ChangeListener for F
where
    F: Fn(&TopologyChange) + Send + Sync,
{
    fn on_change(&self, change: &TopologyChange) {
        self(change)
    }
}

/// Fan-out point for committed changes.
pub struct Notifier {
    tx: watch::Sender<TopologyChange>,
    listeners: Mutex<Vec<Arc<dyn ChangeListener>>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("latest", &*self.tx.borrow())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

impl Notifier {
    pub fn new(version: u64) -> Self {
        let (tx, _rx) = watch::channel(TopologyChange::loaded(version));
        Self {
            tx,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to the coalescing channel.
    ///
    /// The current value is marked as seen; `changed()` resolves on the
    /// next commit.
    pub fn subscribe(&self) -> watch::Receiver<TopologyChange> {
        self.tx.subscribe()
    }

    pub fn add_listener(&self, listener: Arc<dyn ChangeListener>) {
        self.listeners.lock().push(listener);
    }

    /// The most recently published change.
    pub fn latest(&self) -> TopologyChange {
        self.tx.borrow().clone()
    }

    /// Publish a change to every subscriber and listener.
    ///
    /// The watch value only moves forward: two writers that commit
    /// back to back may publish out of order, and the older version is
    /// then not re-announced.
    ///
    /// Must not be called while holding the engine state lock.
    pub fn publish(&self, change: TopologyChange) {
        // Snapshot the list so a listener can register another listener.
        let listeners: Vec<_> = self.listeners.lock().clone();
        self.tx.send_if_modified(|latest| {
            if change.version > latest.version {
                *latest = change.clone();
                true
            } else {
                false
            }
        });
        for listener in listeners {
            listener.on_change(&change);
        }
    }
}
