//! Read-only commands: list, tree, show, path.

use anyhow::Result;

use super::session::read_engine;
use crate::cli::Context;
use crate::core::types::LocationId;
use crate::ui::output;

/// List all locations in hierarchy order.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let engine = read_engine(ctx)?;
    let snapshot = engine.snapshot()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.locations.is_empty() {
        output::print("No locations.", ctx.verbosity());
        return Ok(());
    }
    for location in &snapshot.locations {
        println!("{}", output::format_location(location));
    }
    Ok(())
}

/// Render the hierarchy as a tree.
pub fn tree(ctx: &Context, json: bool) -> Result<()> {
    let engine = read_engine(ctx)?;
    let roots = engine.tree()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&roots)?);
    } else if roots.is_empty() {
        output::print("No locations.", ctx.verbosity());
    } else {
        println!("{}", output::format_tree(&roots));
    }
    Ok(())
}

/// Show one location.
pub fn show(ctx: &Context, id: &LocationId, json: bool) -> Result<()> {
    let engine = read_engine(ctx)?;
    let location = engine.get(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&location)?);
    } else {
        println!("{}", output::format_details(&location));
    }
    Ok(())
}

/// Print the ids from the root down to `id`.
pub fn path(ctx: &Context, id: &LocationId) -> Result<()> {
    let engine = read_engine(ctx)?;
    let path = engine.path(id)?;
    let rendered: Vec<_> = path.iter().map(LocationId::as_str).collect();
    println!("{}", rendered.join(" / "));
    Ok(())
}
