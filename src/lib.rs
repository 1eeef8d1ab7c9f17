//! spacetree - Location hierarchy and reorder engine
//!
//! spacetree models a physical space as a tree of locations (house,
//! building, grounds, floor, room, area) and attaches behavior modules,
//! such as occupancy detection sources, to them.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Transactional operations, move algorithm, change notification
//! - [`core`] - Domain types, schemas, verification, and persistence
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! spacetree maintains the following invariants:
//!
//! 1. Every location id appears exactly once in the hierarchy
//! 2. The parent graph is acyclic
//! 3. Sibling order is dense and unique within every group
//! 4. A failed operation leaves no partial change behind
//! 5. Corrupt persisted state is reported, never silently repaired

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
