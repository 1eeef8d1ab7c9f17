//! core::ops
//!
//! Cross-process coordination for the persisted store.
//!
//! Every mutating CLI invocation:
//! 1. Acquires the store lock (bounded wait)
//! 2. Loads and verifies the persisted location set
//! 3. Applies one engine operation
//! 4. Saves atomically, then releases the lock

pub mod lock;

pub use lock::{LockError, StoreLock};
