//! Location lifecycle commands: create, rename, edit, delete.

use anyhow::{bail, Result};

use super::session::mutate;
use crate::cli::Context;
use crate::core::location::{LocationPatch, NewLocation};
use crate::core::types::LocationId;
use crate::engine::DeletePolicy;
use crate::ui::output;

/// Create a location at the end of its parent's children.
pub fn create(
    ctx: &Context,
    name: &str,
    location_type: &str,
    id: Option<LocationId>,
    parent: Option<LocationId>,
    area: Option<String>,
) -> Result<()> {
    let fields = NewLocation {
        id,
        name: name.to_string(),
        location_type: location_type.to_string(),
        parent_id: parent,
        ha_area_id: area,
    };
    let location = mutate(ctx, |engine| engine.create(fields))?;

    if ctx.quiet {
        println!("{}", location.id);
    } else {
        println!("Created {}", output::format_location(&location));
    }
    Ok(())
}

/// Rename a location.
pub fn rename(ctx: &Context, id: &LocationId, name: &str) -> Result<()> {
    let location = mutate(ctx, |engine| {
        engine.update_fields(id, LocationPatch::rename(name))
    })?;
    output::print(
        format!("Renamed {} to '{}'", location.id, location.name),
        ctx.verbosity(),
    );
    Ok(())
}

/// Change type and/or area reference.
pub fn edit(
    ctx: &Context,
    id: &LocationId,
    location_type: Option<String>,
    area: Option<String>,
    clear_area: bool,
) -> Result<()> {
    let patch = LocationPatch {
        name: None,
        ha_area_id: if clear_area { Some(None) } else { area.map(Some) },
        location_type,
    };
    if patch.is_empty() {
        bail!("Nothing to change. Pass --type, --area, or --clear-area.");
    }

    let location = mutate(ctx, |engine| engine.update_fields(id, patch))?;
    output::print(
        format!("Updated {}", output::format_location(&location)),
        ctx.verbosity(),
    );
    Ok(())
}

/// Delete a location, optionally with its subtree.
pub fn delete(ctx: &Context, id: &LocationId, cascade: bool) -> Result<()> {
    let policy = if cascade {
        DeletePolicy::Cascade
    } else {
        DeletePolicy::LeafOnly
    };
    let removed = mutate(ctx, |engine| engine.delete(id, policy))?;

    if removed.len() == 1 {
        output::print(format!("Deleted {}", id), ctx.verbosity());
    } else {
        output::print(
            format!("Deleted {} and {} descendant(s)", id, removed.len() - 1),
            ctx.verbosity(),
        );
    }
    Ok(())
}
