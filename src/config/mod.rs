//! Configuration management for spiderhook
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use spiderhook::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `SPIDERHOOK__<section>__<key>`
//!
//! Examples:
//! - `SPIDERHOOK__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `SPIDERHOOK__SCHEDULER__INTERVAL=30m`
//! - `SPIDERHOOK__DOWNLOAD__TIMEOUT=2m`
//!
//! The bearer token is only read from `SPIDERHOOK_AUTH_TOKEN`.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/spiderhook.toml`.
//! This can be overridden using the `SPIDERHOOK_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, DownloadConfig, DownloadProviderConfig, DownloadProviderKind, PtProviderConfig,
    SchedulerConfig, ServerConfig, SourceProviderConfig, SourceProviderKind,
};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`SPIDERHOOK__*`)
    /// 2. TOML file (default: `config/spiderhook.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Same as [`Config::load`] with an explicit file path taking precedence
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files. Secrets are not read.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
