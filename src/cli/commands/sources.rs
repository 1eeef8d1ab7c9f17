//! Module attachment commands: attach, detach, sources.

use anyhow::Result;

use super::session::{mutate, read_engine};
use crate::cli::Context;
use crate::core::modules::SourceSpec;
use crate::core::types::LocationId;
use crate::ui::output;

/// Attach a source; omitted fields get category defaults.
pub fn attach(
    ctx: &Context,
    id: &LocationId,
    module: &str,
    entity_id: &str,
    mode: Option<String>,
    timeout: Option<u64>,
    off_event: Option<String>,
) -> Result<()> {
    let spec = SourceSpec {
        entity_id: entity_id.to_string(),
        mode,
        on_timeout: timeout,
        off_event,
    };
    let source = mutate(ctx, |engine| engine.attach_source(id, module, spec))?;
    output::print(
        format!("Attached {} to {}", output::format_source(&source), id),
        ctx.verbosity(),
    );
    Ok(())
}

/// Detach a source.
pub fn detach(ctx: &Context, id: &LocationId, module: &str, entity_id: &str) -> Result<()> {
    let removed = mutate(ctx, |engine| engine.remove_source(id, module, entity_id))?;
    output::print(
        format!("Detached {} from {}", removed.entity_id, id),
        ctx.verbosity(),
    );
    Ok(())
}

/// List attached sources.
pub fn sources(ctx: &Context, id: &LocationId, module: &str, json: bool) -> Result<()> {
    let engine = read_engine(ctx)?;
    let sources = engine.list_sources(id, module)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
    } else if sources.is_empty() {
        output::print(format!("No {} sources on {}.", module, id), ctx.verbosity());
    } else {
        let lines: Vec<_> = sources.iter().map(output::format_source).collect();
        println!("{}", output::format_list(&lines, ""));
    }
    Ok(())
}
