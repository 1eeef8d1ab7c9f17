//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting, tree rendering, and display
//!
//! # Design
//!
//! All human-readable output goes through this module so formatting and
//! quiet handling stay consistent. Diagnostics go through `tracing`
//! instead.

pub mod output;
