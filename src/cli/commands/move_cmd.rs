//! move and reorder commands
//!
//! Each invocation is one engine move. A repeated invocation is reported
//! as unchanged rather than failing, so scripted retries are safe.

use anyhow::Result;

use super::session::mutate;
use crate::cli::Context;
use crate::core::types::LocationId;
use crate::engine::MoveResult;
use crate::ui::output;

/// Move a location under a new parent, or to the root.
///
/// Without `index` the location goes last among its new siblings.
pub fn move_location(
    ctx: &Context,
    id: &LocationId,
    parent: Option<LocationId>,
    index: Option<usize>,
) -> Result<()> {
    let index = index.unwrap_or(usize::MAX);
    let result = mutate(ctx, |engine| engine.move_location(id, parent.as_ref(), index))?;
    report(ctx, &result);
    Ok(())
}

/// Move a location within its current sibling group.
pub fn reorder(ctx: &Context, id: &LocationId, index: usize) -> Result<()> {
    let result = mutate(ctx, |engine| engine.reorder(id, index))?;
    report(ctx, &result);
    Ok(())
}

fn report(ctx: &Context, result: &MoveResult) {
    if !result.changed {
        output::print(format!("{} unchanged", result.id), ctx.verbosity());
        return;
    }

    let target = match &result.new_parent {
        Some(parent) => format!("under {}", parent),
        None => "to root".to_string(),
    };
    output::print(
        format!("Moved {} {} at position {}", result.id, target, result.index),
        ctx.verbosity(),
    );
}
