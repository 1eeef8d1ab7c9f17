//! engine::error
//!
//! Typed errors returned by every engine operation.
//!
//! None of these are fatal to the engine: a failed operation leaves all
//! state exactly as it was.

use std::time::Duration;

use thiserror::Error;

use crate::core::modules::{ModuleError, ModuleKind};
use crate::core::ops::lock::LockError;
use crate::core::rules::RuleViolation;
use crate::core::store::StoreError;
use crate::core::types::{LocationId, LocationType, TypeError};

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("location not found: {0}")]
    NotFound(LocationId),

    #[error("location id already exists: {0}")]
    DuplicateId(LocationId),

    #[error("invalid location id: {0}")]
    InvalidId(String),

    #[error("unrecognized location type '{0}'")]
    InvalidType(String),

    #[error("invalid location name {0:?}")]
    InvalidName(String),

    #[error("a {child} cannot be placed {}", placement(.parent))]
    InvalidHierarchy {
        child: LocationType,
        parent: Option<LocationType>,
    },

    #[error("moving '{location}' under '{target}' would create a cycle")]
    WouldCreateCycle {
        location: LocationId,
        target: LocationId,
    },

    #[error("location '{id}' has {count} child location(s)")]
    HasChildren { id: LocationId, count: usize },

    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("entity '{entity_id}' is already attached to {module} on '{location}'")]
    DuplicateSource {
        location: LocationId,
        module: ModuleKind,
        entity_id: String,
    },

    #[error("entity '{entity_id}' is not attached to {module} on '{location}'")]
    SourceNotFound {
        location: LocationId,
        module: ModuleKind,
        entity_id: String,
    },

    #[error("unrecognized mode '{0}'")]
    InvalidMode(String),

    #[error("invalid entity id '{0}'")]
    InvalidEntityId(String),

    #[error("area '{0}' is not known to the area registry")]
    UnknownArea(String),

    #[error("entity '{0}' is not known to the entity registry")]
    UnknownEntity(String),

    #[error("hierarchy is busy (lock not acquired within {timeout:?})")]
    Busy { timeout: Duration },

    #[error("corrupt state: {0}")]
    CorruptState(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

fn placement(parent: &Option<LocationType>) -> String {
    match parent {
        Some(p) => format!("under a {p}"),
        None => "at the root".to_string(),
    }
}

/// Stable error classification for transport adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    DuplicateId,
    InvalidInput,
    InvalidType,
    InvalidHierarchy,
    WouldCreateCycle,
    HasChildren,
    DuplicateSource,
    SourceNotFound,
    InvalidMode,
    UnknownReference,
    Busy,
    CorruptState,
    Persistence,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::DuplicateId(_) => ErrorKind::DuplicateId,
            EngineError::InvalidId(_)
            | EngineError::InvalidName(_)
            | EngineError::InvalidEntityId(_)
            | EngineError::UnknownModule(_) => ErrorKind::InvalidInput,
            EngineError::InvalidType(_) => ErrorKind::InvalidType,
            EngineError::InvalidHierarchy { .. } => ErrorKind::InvalidHierarchy,
            EngineError::WouldCreateCycle { .. } => ErrorKind::WouldCreateCycle,
            EngineError::HasChildren { .. } => ErrorKind::HasChildren,
            EngineError::DuplicateSource { .. } => ErrorKind::DuplicateSource,
            EngineError::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            EngineError::InvalidMode(_) => ErrorKind::InvalidMode,
            EngineError::UnknownArea(_) | EngineError::UnknownEntity(_) => {
                ErrorKind::UnknownReference
            }
            EngineError::Busy { .. } => ErrorKind::Busy,
            EngineError::CorruptState(_) => ErrorKind::CorruptState,
            EngineError::Persistence(StoreError::Lock(LockError::Busy { .. })) => ErrorKind::Busy,
            EngineError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Attach location context to a module validation error.
    pub(crate) fn from_module(location: &LocationId, err: ModuleError) -> Self {
        match err {
            ModuleError::UnknownModule(m) => EngineError::UnknownModule(m),
            ModuleError::InvalidMode(m) | ModuleError::InvalidOffEvent(m) => {
                EngineError::InvalidMode(m)
            }
            ModuleError::InvalidEntityId(e) => EngineError::InvalidEntityId(e),
            ModuleError::DuplicateSource { module, entity_id } => EngineError::DuplicateSource {
                location: location.clone(),
                module,
                entity_id,
            },
            ModuleError::SourceNotFound { module, entity_id } => EngineError::SourceNotFound {
                location: location.clone(),
                module,
                entity_id,
            },
        }
    }
}

impl From<TypeError> for EngineError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidType(t) => EngineError::InvalidType(t),
            TypeError::InvalidLocationId(msg) => EngineError::InvalidId(msg),
        }
    }
}

impl From<RuleViolation> for EngineError {
    fn from(v: RuleViolation) -> Self {
        EngineError::InvalidHierarchy {
            child: v.child,
            parent: v.parent,
        }
    }
}
