//! cli
//!
//! Command-line interface layer for spacetree.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and the persisted store
//! - Delegate to command handlers
//! - Does NOT mutate the hierarchy directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap, loads the store
//! into an [`crate::engine::Engine`], invokes exactly one engine
//! operation, and saves. All hierarchy changes flow through the engine's
//! validated operations.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::Result;

use crate::ui::output::Verbosity;

/// Execution context built from global flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Data directory override
    pub data_dir: Option<PathBuf>,
    /// Explicit config file
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        data_dir: cli.data_dir,
        config: cli.config,
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
