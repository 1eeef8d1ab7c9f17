//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--data-dir <path>`: Use this directory for the persisted store
//! - `--config <path>`: Use this config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::types::LocationId;

/// spacetree - Model a physical space as a tree of locations
#[derive(Parser, Debug)]
#[command(name = "st")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the persisted store (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Config file to use instead of the standard locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

fn parse_id(raw: &str) -> Result<LocationId, String> {
    LocationId::new(raw).map_err(|e| e.to_string())
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all locations in hierarchy order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the location tree
    #[command(
        after_help = "\
EXAMPLES:
    st tree
    st tree --json > layout.json"
    )]
    Tree {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one location in detail
    Show {
        /// Location id
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the path from the root down to a location
    Path {
        /// Location id
        #[arg(value_parser = parse_id)]
        id: LocationId,
    },

    /// Create a location
    #[command(
        after_help = "\
EXAMPLES:
    st create \"Home\" --type building --id home
    st create \"Main Floor\" --type floor --parent home
    st create \"Kitchen\" --type room --parent main-floor --area kitchen"
    )]
    Create {
        /// Display name
        name: String,

        /// Location type (house, building, grounds, floor, room, area)
        #[arg(long = "type", short = 't')]
        location_type: String,

        /// Explicit id (generated when omitted)
        #[arg(long, value_parser = parse_id)]
        id: Option<LocationId>,

        /// Parent location (root when omitted)
        #[arg(long, value_parser = parse_id)]
        parent: Option<LocationId>,

        /// External area reference
        #[arg(long)]
        area: Option<String>,
    },

    /// Rename a location
    Rename {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// New display name
        name: String,
    },

    /// Change the type or area reference of a location
    Edit {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// New location type
        #[arg(long = "type", short = 't')]
        location_type: Option<String>,

        /// New external area reference
        #[arg(long, conflicts_with = "clear_area")]
        area: Option<String>,

        /// Remove the external area reference
        #[arg(long)]
        clear_area: bool,
    },

    /// Move a location to a new parent and position
    #[command(
        long_about = "Move a location to a new parent and sibling position.\n\n\
            The index is clamped to the target group, so an out-of-range index \
            appends. Repeating the same move leaves the tree unchanged.",
        after_help = "\
EXAMPLES:
    # Put kitchen first under the second floor
    st move kitchen --parent second-floor --index 0

    # Promote kitchen to the root
    st move kitchen --root"
    )]
    Move {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// New parent location
        #[arg(long, value_parser = parse_id, required_unless_present = "root")]
        parent: Option<LocationId>,

        /// Move to the root
        #[arg(long, conflicts_with = "parent")]
        root: bool,

        /// Position among the new siblings (default: last)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Change a location's position among its siblings
    Reorder {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// New position
        index: usize,
    },

    /// Delete a location
    Delete {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// Also delete every descendant
        #[arg(long)]
        cascade: bool,
    },

    /// Attach an occupancy source to a location
    #[command(
        after_help = "\
EXAMPLES:
    # Media players default to any_change with a 1800s timeout
    st attach living-room media_player.tv

    st attach kitchen binary_sensor.kitchen_motion --mode state"
    )]
    Attach {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// Entity id, e.g. binary_sensor.kitchen_motion
        entity_id: String,

        /// Detection mode (state, any_change, timeout)
        #[arg(long)]
        mode: Option<String>,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// How occupancy ends (none, specific_event)
        #[arg(long)]
        off_event: Option<String>,

        /// Module to attach to
        #[arg(long, default_value = "occupancy")]
        module: String,
    },

    /// Detach a source from a location
    Detach {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// Entity id to remove
        entity_id: String,

        /// Module to detach from
        #[arg(long, default_value = "occupancy")]
        module: String,
    },

    /// List the sources attached to a location
    Sources {
        #[arg(value_parser = parse_id)]
        id: LocationId,

        /// Module to list
        #[arg(long, default_value = "occupancy")]
        module: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify the persisted hierarchy
    Verify,

    /// Get or set configuration values
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        after_help = "\
EXAMPLES:
    st completion bash > ~/.local/share/bash-completion/completions/st
    st completion zsh > ~/.zfunc/_st"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
    /// Print the config file path in use
    Path,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
