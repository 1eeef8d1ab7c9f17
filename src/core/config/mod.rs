//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. Explicit path (`--config`)
//! 2. `$SPACETREE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/spacetree/config.toml`
//! 4. `~/.spacetree/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use spacetree::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Lock timeout: {:?}", config.lock_timeout());
//! let rules = config.hierarchy_rules().unwrap();
//! ```

pub mod schema;

pub use schema::{ConfigFile, HierarchyConfig, OccupancyConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::modules::{OccupancyDefaults, DEFAULT_MEDIA_PLAYER_TIMEOUT};
use crate::core::paths::SpacePaths;
use crate::core::rules::HierarchyRules;

/// Default bounded wait for locks.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration with accessors that apply defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: ConfigFile,
    /// Path the file was loaded from, if any
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist; the standard locations are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed or
    /// fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover(),
        };

        let (file, loaded_from) = match path {
            Some(p) if explicit.is_some() || p.exists() => (Self::read(&p)?, Some(p)),
            _ => (ConfigFile::default(), None),
        };

        file.validate()?;
        if let Some(p) = &loaded_from {
            tracing::debug!(path = %p.display(), "loaded config");
        }
        Ok(Self { file, loaded_from })
    }

    /// Build a config from an in-memory file (used by embedders and tests).
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self {
            file,
            loaded_from: None,
        })
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SPACETREE_CONFIG") {
            return Some(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("spacetree/config.toml");
            if path.exists() {
                return Some(path);
            }
        }
        Self::canonical_path().ok()
    }

    fn read(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Canonical write location: `~/.spacetree/config.toml`.
    pub fn canonical_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".spacetree/config.toml"))
    }

    /// Write a config file atomically (temp file + rename).
    pub fn write(path: &Path, file: &ConfigFile) -> Result<(), ConfigError> {
        file.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        };
        let mut out = fs::File::create(&temp_path).map_err(write_err)?;
        out.write_all(contents.as_bytes()).map_err(write_err)?;
        out.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    /// Set one dotted key on a config file.
    pub fn set_key(file: &mut ConfigFile, key: &str, value: &str) -> Result<(), ConfigError> {
        let parse_u64 = |v: &str| {
            v.parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue(format!("{key}: expected an integer")))
        };
        let parse_bool = |v: &str| {
            v.parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue(format!("{key}: expected true or false")))
        };

        match key {
            "data_dir" => file.data_dir = Some(PathBuf::from(value)),
            "lock_timeout_ms" => file.lock_timeout_ms = Some(parse_u64(value)?),
            "hierarchy.root_types" => {
                let types = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect();
                file.hierarchy.get_or_insert_with(Default::default).root_types = Some(types);
            }
            "hierarchy.allow_nested_rooms" => {
                file.hierarchy
                    .get_or_insert_with(Default::default)
                    .allow_nested_rooms = Some(parse_bool(value)?);
            }
            "occupancy.media_player_timeout" => {
                file.occupancy
                    .get_or_insert_with(Default::default)
                    .media_player_timeout = Some(parse_u64(value)?);
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        file.validate()
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Storage paths: configured data dir, else `~/.spacetree`.
    pub fn paths(&self) -> Result<SpacePaths, ConfigError> {
        match &self.file.data_dir {
            Some(dir) => Ok(SpacePaths::new(dir)),
            None => SpacePaths::default_location().ok_or(ConfigError::NoHomeDir),
        }
    }

    /// Bounded wait for locks. Defaults to 250ms.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.file.lock_timeout_ms.unwrap_or(DEFAULT_LOCK_TIMEOUT_MS))
    }

    /// Placement rules with configured tightening applied.
    pub fn hierarchy_rules(&self) -> Result<HierarchyRules, ConfigError> {
        let mut rules = HierarchyRules::default();
        if let Some(h) = &self.file.hierarchy {
            rules.root_types = h.parsed_root_types()?;
            if let Some(nested) = h.allow_nested_rooms {
                rules.allow_nested_rooms = nested;
            }
        }
        Ok(rules)
    }

    /// Occupancy defaults. Media player timeout defaults to 1800s.
    pub fn occupancy_defaults(&self) -> OccupancyDefaults {
        OccupancyDefaults {
            media_player_timeout: self
                .file
                .occupancy
                .as_ref()
                .and_then(|o| o.media_player_timeout)
                .unwrap_or(DEFAULT_MEDIA_PLAYER_TIMEOUT),
        }
    }

    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
