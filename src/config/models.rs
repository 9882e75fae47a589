use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use super::validation::ValidationError;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Upper bound on request bodies accepted by create/update
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: ByteSize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_max_body_bytes() -> ByteSize {
    ByteSize(1024 * 1024) // 1 MB
}

/// Store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// `fjall://<path>` or `memory://`
    #[serde(default = "default_store_uri")]
    pub uri: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_store_uri(),
        }
    }
}

fn default_store_uri() -> String {
    "fjall://data/recipes".to_string()
}

/// Store backend resolved from `store.uri`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Memory,
    Fjall(PathBuf),
}

impl FromStr for StoreTarget {
    type Err = ValidationError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidStoreUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = uri
            .trim()
            .split_once("://")
            .ok_or_else(|| invalid("expected <scheme>://"))?;

        match scheme {
            "memory" if rest.is_empty() => Ok(StoreTarget::Memory),
            "memory" => Err(invalid("memory:// takes no path")),
            "fjall" if rest.is_empty() => Err(invalid("fjall:// requires a path")),
            "fjall" => Ok(StoreTarget::Fjall(PathBuf::from(rest))),
            _ => Err(invalid("unsupported scheme, expected 'fjall' or 'memory'")),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Emit one span per HTTP request
    #[serde(default = "default_request_logging")]
    pub request_logging: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            request_logging: default_request_logging(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_request_logging() -> bool {
    true
}
