//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and the persisted store
//! 2. Calls exactly one engine operation
//! 3. Saves (mutating commands only) and formats output
//!
//! Handlers do NOT mutate records directly.

mod completion;
mod config_cmd;
mod location;
mod move_cmd;
mod query;
mod session;
mod sources;
mod verify;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use location::{create, delete, edit, rename};
pub use move_cmd::{move_location, reorder};
pub use query::{list, path, show, tree};
pub use sources::{attach, detach, sources};
pub use verify::verify;

use anyhow::Result;

use super::args::{Command, ConfigAction};
use super::Context;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    tracing::debug!(?command, "dispatch");
    match command {
        // Read-only commands
        Command::List { json } => list(ctx, json),
        Command::Tree { json } => tree(ctx, json),
        Command::Show { id, json } => show(ctx, &id, json),
        Command::Path { id } => path(ctx, &id),
        Command::Sources { id, module, json } => sources(ctx, &id, &module, json),
        Command::Verify => verify(ctx),

        // Mutating commands
        Command::Create {
            name,
            location_type,
            id,
            parent,
            area,
        } => create(ctx, &name, &location_type, id, parent, area),
        Command::Rename { id, name } => rename(ctx, &id, &name),
        Command::Edit {
            id,
            location_type,
            area,
            clear_area,
        } => edit(ctx, &id, location_type, area, clear_area),
        Command::Move {
            id,
            parent,
            root: _,
            index,
        } => move_location(ctx, &id, parent, index),
        Command::Reorder { id, index } => reorder(ctx, &id, index),
        Command::Delete { id, cascade } => delete(ctx, &id, cascade),
        Command::Attach {
            id,
            entity_id,
            mode,
            timeout,
            off_event,
            module,
        } => attach(ctx, &id, &module, &entity_id, mode, timeout, off_event),
        Command::Detach {
            id,
            entity_id,
            module,
        } => detach(ctx, &id, &module, &entity_id),

        // Configuration and tooling
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
            ConfigAction::Path => config_cmd::path(ctx),
        },
        Command::Completion { shell } => completion(shell),
    }
}
