//! Command-line interface parsing for the Pokedex CLI
//!
//! This module handles parsing of CLI arguments using clap and merges them with
//! the optional configuration file into a validated [`StartupConfig`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::config::{ConfigError, FileConfig};
use crate::data::pokeapi::{DEFAULT_PAGE_SIZE, POKEAPI_BASE_URL};

/// Default cache sweep period and expiry age in seconds
pub const DEFAULT_CACHE_INTERVAL_SECS: u64 = 60;

/// Default catch threshold: rolls below this value succeed
pub const DEFAULT_CATCH_DIFFICULTY: u32 = 40;

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file or a merged setting was invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Pokedex - browse PokeAPI location areas and catch Pokemon
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Interactive Pokedex backed by the PokeAPI")]
#[command(version)]
pub struct Cli {
    /// Seconds a cached response is kept before the sweep may remove it
    #[arg(long, value_name = "SECS")]
    pub cache_interval: Option<u64>,

    /// API root to query instead of the public PokeAPI
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Number of location areas shown per page
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Path to a JSON config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration derived from CLI arguments and the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Cache sweep period and expiry age
    pub cache_interval: Duration,
    /// API root
    pub base_url: String,
    /// Location areas per page
    pub page_size: u32,
    /// Catch threshold
    pub catch_difficulty: u32,
    /// Whether debug logging was requested
    pub verbose: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            cache_interval: Duration::from_secs(DEFAULT_CACHE_INTERVAL_SECS),
            base_url: POKEAPI_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            catch_difficulty: DEFAULT_CATCH_DIFFICULTY,
            verbose: false,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// Loads the file given by `--config`, or the default config file if it
    /// exists, then applies the CLI flags on top.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the config file is unreadable or a setting is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::load_default()?,
        };
        Self::merge(cli, &file)
    }

    /// Applies CLI flags over file settings over defaults, then validates
    pub fn merge(cli: &Cli, file: &FileConfig) -> Result<Self, CliError> {
        let defaults = Self::default();

        let interval_secs = cli
            .cache_interval
            .or(file.cache_interval_secs)
            .unwrap_or(DEFAULT_CACHE_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(ConfigError::InvalidInterval.into());
        }

        let page_size = cli.page_size.or(file.page_size).unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(ConfigError::InvalidPageSize.into());
        }

        Ok(Self {
            cache_interval: Duration::from_secs(interval_secs),
            base_url: cli
                .base_url
                .clone()
                .or_else(|| file.base_url.clone())
                .unwrap_or(defaults.base_url),
            page_size,
            catch_difficulty: file.catch_difficulty.unwrap_or(defaults.catch_difficulty),
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["pokedex"]);
        assert!(cli.cache_interval.is_none());
        assert!(cli.base_url.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_all_flags() {
        let cli = Cli::parse_from([
            "pokedex",
            "--cache-interval",
            "5",
            "--base-url",
            "http://localhost:8000/api/v2",
            "--page-size",
            "10",
            "--config",
            "/tmp/pokedex.json",
            "-v",
        ]);
        assert_eq!(cli.cache_interval, Some(5));
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8000/api/v2"));
        assert_eq!(cli.page_size, Some(10));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pokedex.json")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_rejects_non_numeric_interval() {
        let result = Cli::try_parse_from(["pokedex", "--cache-interval", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_defaults() {
        let cli = Cli::parse_from(["pokedex"]);
        let config = StartupConfig::merge(&cli, &FileConfig::default()).unwrap();
        assert_eq!(config, StartupConfig::default());
        assert_eq!(config.cache_interval, Duration::from_secs(60));
        assert_eq!(config.base_url, "https://pokeapi.co/api/v2");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.catch_difficulty, 40);
    }

    #[test]
    fn test_merge_file_overrides_defaults() {
        let cli = Cli::parse_from(["pokedex"]);
        let file = FileConfig {
            base_url: Some("http://mirror/api/v2".to_string()),
            cache_interval_secs: Some(300),
            page_size: Some(50),
            catch_difficulty: Some(70),
        };

        let config = StartupConfig::merge(&cli, &file).unwrap();

        assert_eq!(config.cache_interval, Duration::from_secs(300));
        assert_eq!(config.base_url, "http://mirror/api/v2");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.catch_difficulty, 70);
    }

    #[test]
    fn test_merge_cli_overrides_file() {
        let cli = Cli::parse_from(["pokedex", "--cache-interval", "7", "--page-size", "3"]);
        let file = FileConfig {
            cache_interval_secs: Some(300),
            page_size: Some(50),
            ..Default::default()
        };

        let config = StartupConfig::merge(&cli, &file).unwrap();

        assert_eq!(config.cache_interval, Duration::from_secs(7));
        assert_eq!(config.page_size, 3);
    }

    #[test]
    fn test_merge_rejects_zero_interval() {
        let cli = Cli::parse_from(["pokedex", "--cache-interval", "0"]);
        let err = StartupConfig::merge(&cli, &FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid cache interval"));
    }

    #[test]
    fn test_merge_rejects_zero_interval_from_file() {
        let cli = Cli::parse_from(["pokedex"]);
        let file = FileConfig {
            cache_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(StartupConfig::merge(&cli, &file).is_err());
    }

    #[test]
    fn test_merge_rejects_zero_page_size() {
        let cli = Cli::parse_from(["pokedex", "--page-size", "0"]);
        let err = StartupConfig::merge(&cli, &FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid page size"));
    }

    #[test]
    fn test_from_cli_with_missing_config_file_fails() {
        let cli = Cli::parse_from(["pokedex", "--config", "/nonexistent/pokedex/config.json"]);
        let result = StartupConfig::from_cli(&cli);
        assert!(matches!(result, Err(CliError::Config(ConfigError::Io { .. }))));
    }
}
