//! config command - Get, set, or list configuration values

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::session::{file_store, load_config};
use crate::cli::Context;
use crate::core::config::{Config, ConfigFile};

const KEYS: [&str; 5] = [
    "data_dir",
    "lock_timeout_ms",
    "hierarchy.root_types",
    "hierarchy.allow_nested_rooms",
    "occupancy.media_player_timeout",
];

/// Effective value for `key`, with defaults applied.
fn effective(ctx: &Context, config: &Config, key: &str) -> Result<String> {
    let value = match key {
        "data_dir" => file_store(ctx, config)?
            .paths()
            .data_dir()
            .display()
            .to_string(),
        "lock_timeout_ms" => config.lock_timeout().as_millis().to_string(),
        "hierarchy.root_types" => config
            .hierarchy_rules()?
            .root_types
            .map(|types| {
                types
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default(),
        "hierarchy.allow_nested_rooms" => config.hierarchy_rules()?.allow_nested_rooms.to_string(),
        "occupancy.media_player_timeout" => {
            config.occupancy_defaults().media_player_timeout.to_string()
        }
        _ => bail!("Unknown configuration key: {}", key),
    };
    Ok(value)
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = load_config(ctx)?;
    let value = effective(ctx, &config, key)?;
    if !value.is_empty() {
        println!("{}", value);
    }
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    for key in KEYS {
        println!("{} = {}", key, effective(ctx, &config, key)?);
    }
    Ok(())
}

/// Path that `set` writes to.
fn target_path(ctx: &Context) -> Result<PathBuf> {
    if let Some(path) = &ctx.config {
        return Ok(path.clone());
    }
    let config = load_config(ctx)?;
    match config.loaded_from() {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::canonical_path().context("Failed to locate config file"),
    }
}

/// Print the config file path in use.
pub fn path(ctx: &Context) -> Result<()> {
    println!("{}", target_path(ctx)?.display());
    Ok(())
}

/// Set a configuration value.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let path = target_path(ctx)?;
    let mut file = if path.exists() {
        Config::load(Some(&path))
            .context("Failed to load config")?
            .file
    } else {
        ConfigFile::default()
    };

    Config::set_key(&mut file, key, value).context("Invalid configuration value")?;
    Config::write(&path, &file).context("Failed to write config")?;

    if !ctx.quiet {
        println!("Set {} = {}", key, value);
    }
    Ok(())
}
