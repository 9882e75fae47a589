//! Configuration management for recipebox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (`RECIPEBOX__<section>__<key>`)
//! 4. `RECIPEBOX_STORE_URI`, the store connection target (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use recipebox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Examples:
//! - `RECIPEBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `RECIPEBOX__SERVER__MAX_BODY_BYTES=2MB`
//! - `RECIPEBOX__TELEMETRY__LOG_FILTER=recipebox=debug`
//! - `RECIPEBOX_STORE_URI=fjall:///var/lib/recipebox`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/recipebox.toml`.
//! This can be overridden using the `RECIPEBOX_CONFIG` environment variable
//! or the `--config` flag.

mod models;
mod sources;
mod validation;

use std::path::PathBuf;

pub use crate::humanize::ByteSize;
pub use models::{Config, ServerConfig, StoreConfig, StoreTarget, TelemetryConfig};
pub use validation::ValidationError;

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
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or the
    /// resulting configuration fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Like [`Config::load`], but reads the TOML file at `path` when given
    /// instead of the default location.
    pub fn load_with(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config = sources::load(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, without the store uri
    /// override. Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// The store backend named by `store.uri`.
    pub fn store_target(&self) -> Result<StoreTarget, ValidationError> {
        self.store.uri.parse()
    }
}
