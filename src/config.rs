//! Optional configuration file for the Pokedex CLI
//!
//! Settings are read from `config.json` in the platform config directory
//! (`~/.config/pokedex/` on Linux) or from an explicit `--config` path. Every
//! field is optional; command-line flags take precedence over the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

/// File name of the configuration file inside the config directory
const CONFIG_FILE_NAME: &str = "config.json";

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid JSON for this schema
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The cache interval was zero
    #[error("Invalid cache interval: must be at least 1 second")]
    InvalidInterval,

    /// The page size was zero
    #[error("Invalid page size: must be at least 1")]
    InvalidPageSize,
}

/// Settings that can be provided through the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// API root, e.g. `https://pokeapi.co/api/v2`
    pub base_url: Option<String>,
    /// Cache sweep period and expiry age in seconds
    pub cache_interval_secs: Option<u64>,
    /// Location areas per page
    pub page_size: Option<u32>,
    /// Rolls below this value catch the Pokemon
    pub catch_difficulty: Option<u32>,
}

impl FileConfig {
    /// Reads the configuration file at `path`
    ///
    /// # Returns
    /// * `Ok(FileConfig)` if the file exists and parses
    /// * `Err(ConfigError)` if the file is missing, unreadable, or malformed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the configuration file from the default location, if there is one
    ///
    /// A missing file (or no resolvable home directory) yields the empty config.
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Path of the configuration file in the XDG-compliant config directory
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pokedex").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
