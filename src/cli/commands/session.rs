//! Shared load/save plumbing for command handlers.
//!
//! Read-only commands load the store without locking: saves replace the
//! file atomically, so a reader always sees a whole document. Mutating
//! commands hold the store lock from load through save so concurrent
//! invocations serialize instead of losing each other's writes.

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;
use crate::core::store::FileStore;
use crate::engine::{Engine, EngineError, EngineOptions, LoadReport};
use crate::ui::output;

/// Load configuration, honoring `--config`.
pub fn load_config(ctx: &Context) -> Result<Config> {
    Config::load(ctx.config.as_deref()).context("Failed to load config")
}

/// The file store selected by `--data-dir` or the config.
pub fn file_store(ctx: &Context, config: &Config) -> Result<FileStore> {
    let paths = match &ctx.data_dir {
        Some(dir) => crate::core::paths::SpacePaths::new(dir),
        None => config.paths().context("Failed to resolve data directory")?,
    };
    Ok(FileStore::new(paths, config.lock_timeout()))
}

fn open(ctx: &Context, config: &Config, store: &FileStore) -> Result<(Engine, LoadReport)> {
    let options = EngineOptions::from_config(config).context("Invalid hierarchy config")?;
    let (engine, report) = Engine::open(store, options).context("Failed to load locations")?;
    report_repairs(ctx, &report);
    Ok((engine, report))
}

fn report_repairs(ctx: &Context, report: &LoadReport) {
    for issue in &report.repaired {
        output::warn(format!("repaired on load: {}", issue), ctx.verbosity());
    }
    for issue in &report.outside_policy {
        output::warn(issue, ctx.verbosity());
    }
}

/// Load the persisted hierarchy for reading.
pub fn read_engine(ctx: &Context) -> Result<Engine> {
    let config = load_config(ctx)?;
    let store = file_store(ctx, &config)?;
    Ok(open(ctx, &config, &store)?.0)
}

/// Load, run one engine operation, and save, all under the store lock.
///
/// Nothing is written if the operation fails. A successful no-op writes
/// only when loading repaired the stored document.
pub fn mutate<T>(ctx: &Context, op: impl FnOnce(&Engine) -> Result<T, EngineError>) -> Result<T> {
    let config = load_config(ctx)?;
    let store = file_store(ctx, &config)?;
    let _lock = store.lock().context("Failed to lock location store")?;

    let (engine, report) = open(ctx, &config, &store)?;
    let before = engine.version()?;
    let value = op(&engine)?;

    if engine.version()? != before || !report.repaired.is_empty() {
        engine.save(&store).context("Failed to save locations")?;
    }
    Ok(value)
}
