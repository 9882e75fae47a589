//! Logging setup and request counters

use std::sync::atomic::{AtomicU64, Ordering};

use tracing_subscriber::EnvFilter;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured `filter` when it is set.
pub fn init_tracing(filter: &str) -> Result<(), AnyError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter)?,
    };

    tracing_subscriber::fmt().with_env_filter(env_filter).try_init()?;
    Ok(())
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    recipes_created: AtomicU64,
    recipes_updated: AtomicU64,
    recipes_deleted: AtomicU64,
    requests_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipe_created(&self) {
        self.recipes_created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "recipes_created", "Metric incremented");
    }

    pub fn recipe_updated(&self) {
        self.recipes_updated.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "recipes_updated", "Metric incremented");
    }

    pub fn recipe_deleted(&self) {
        self.recipes_deleted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "recipes_deleted", "Metric incremented");
    }

    pub fn request_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "requests_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            recipes_created: self.recipes_created.load(Ordering::Relaxed),
            recipes_updated: self.recipes_updated.load(Ordering::Relaxed),
            recipes_deleted: self.recipes_deleted.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub recipes_created: u64,
    pub recipes_updated: u64,
    pub recipes_deleted: u64,
    pub requests_failed: u64,
}
