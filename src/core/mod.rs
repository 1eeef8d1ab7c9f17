//! core
//!
//! Core domain types, schemas, and persistence for spacetree.
//!
//! # Modules
//!
//! - [`types`] - Strong types: LocationId, LocationType, Fingerprint
//! - [`location`] - The location record and create/patch inputs
//! - [`modules`] - Module attachment model (occupancy sources)
//! - [`rules`] - Allowed-parent table for location types
//! - [`hierarchy`] - Ordered parent/child index
//! - [`store`] - In-memory location table and persisted document
//! - [`verify`] - Integrity verification of a record set
//! - [`registry`] - Read-only view of external area/entity registries
//! - [`ops`] - Store file locking
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for spacetree storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - All verification is deterministic

pub mod config;
pub mod hierarchy;
pub mod location;
pub mod modules;
pub mod ops;
pub mod paths;
pub mod registry;
pub mod rules;
pub mod store;
pub mod types;
pub mod verify;
