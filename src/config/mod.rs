//! Configuration management for relaybox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use relaybox::config::Config;
//!
//! let config = Config::load(None).expect("Failed to load configuration");
//! println!("Relaying to: {}{}", config.endpoint.base_url, config.endpoint.path);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `RELAYBOX__<section>__<key>`
//!
//! Examples:
//! - `RELAYBOX__ENDPOINT__BASE_URL=http://greeting-service:8080`
//! - `RELAYBOX__WORKER__RESPONSE_SHAPE=content`
//! - `RELAYBOX__HTTP__REQUEST_TIMEOUT_MS=5000`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/relaybox.toml`.
//! This can be overridden with `--config` or the `RELAYBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{Config, EndpointConfig, HttpSettings, WorkerSettings};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to render configuration: {0}")]
    RenderError(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// `path` takes precedence over `RELAYBOX_CONFIG` and the default location.
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (bad endpoint URL, zero timeouts, etc.)
    pub fn load(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, skipping `.env`
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
