use std::sync::Arc;

use crate::config::Config;
use crate::observability::Metrics;
use crate::store::RecipeStore;

/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RecipeStore>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecipeStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.config.server.max_body_bytes.as_usize()
    }
}
