//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, output is machine-readable JSON.

use std::fmt::Display;

use crate::core::location::Location;
use crate::core::modules::OccupancySource;
use crate::engine::TreeNode;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// One-line summary of a location.
///
/// ```
/// use spacetree::core::location::Location;
/// use spacetree::core::types::{LocationId, LocationType};
/// use spacetree::ui::output::format_location;
///
/// let loc = Location {
///     id: LocationId::new("kitchen").unwrap(),
///     name: "Kitchen".into(),
///     location_type: LocationType::Room,
///     parent_id: None,
///     is_explicit_root: true,
///     ha_area_id: None,
///     order_index: 0,
///     modules: Default::default(),
/// };
/// assert_eq!(format_location(&loc), "Kitchen [room] (kitchen) [root]");
/// ```
pub fn format_location(location: &Location) -> String {
    let mut line = format!(
        "{} [{}] ({})",
        location.name, location.location_type, location.id
    );
    if location.is_explicit_root {
        line.push_str(" [root]");
    }
    if let Some(area) = &location.ha_area_id {
        line.push_str(&format!(" area={}", area));
    }
    line
}

/// Detailed multi-line description of a location.
pub fn format_details(location: &Location) -> String {
    let mut lines = vec![
        format!("id: {}", location.id),
        format!("name: {}", location.name),
        format!("type: {}", location.location_type),
        format!(
            "parent: {}",
            location
                .parent_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "(root)".to_string())
        ),
        format!("order: {}", location.order_index),
    ];
    if location.is_explicit_root {
        lines.push("explicit root: yes".to_string());
    }
    if let Some(area) = &location.ha_area_id {
        lines.push(format!("area: {}", area));
    }
    for (module, config) in &location.modules {
        lines.push(format!("{}:", module));
        lines.extend(config.sources.iter().map(|s| format!("  {}", format_source(s))));
    }
    lines.join("\n")
}

/// One-line summary of an occupancy source.
pub fn format_source(source: &OccupancySource) -> String {
    let mut line = format!("{} mode={}", source.entity_id, source.mode);
    if let Some(timeout) = source.on_timeout {
        line.push_str(&format!(" timeout={}s", timeout));
    }
    line.push_str(&format!(" off={}", source.off_event));
    line
}

/// Render a forest with box-drawing branches.
pub fn format_tree(roots: &[TreeNode]) -> String {
    let mut lines = Vec::new();
    for node in roots {
        lines.push(format_location(&node.location));
        render_children(&node.children, "", &mut lines);
    }
    lines.join("\n")
}

fn render_children(children: &[TreeNode], prefix: &str, lines: &mut Vec<String>) {
    for (i, child) in children.iter().enumerate() {
        let last = i + 1 == children.len();
        let (branch, continuation) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        lines.push(format!(
            "{}{}{}",
            prefix,
            branch,
            format_location(&child.location)
        ));
        render_children(&child.children, &format!("{}{}", prefix, continuation), lines);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
