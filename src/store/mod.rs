//! Document store for recipes
//!
//! Handlers only see the [`RecipeStore`] trait; the concrete backend is picked
//! once at startup from the configured store target and shared behind an
//! `Arc<dyn RecipeStore>`.
//!
//! Two backends are provided:
//!
//! - [`FjallStore`]: embedded LSM key-value store persisted on disk
//! - [`MemoryStore`]: process-local map, used for development and tests
//!
//! Both enforce title uniqueness at write time and own the record id and the
//! `createdAt` / `updatedAt` timestamps.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recipebox::store::{MemoryStore, RecipeStore};
//!
//! let store = MemoryStore::new();
//! let recipe = store.create(new_recipe).await?;
//! let fetched = store.find_by_id(&recipe.id).await?;
//! ```

pub mod error;
mod fjall_store;
pub mod keys;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::StoreTarget;
use crate::recipes::{NewRecipe, Recipe, RecipeId, RecipePatch};

pub use error::{Result, StoreError};
pub use fjall_store::{FjallStore, StoreStats};
pub use memory::MemoryStore;

/// Persistence operations the request handlers rely on.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Insert a new recipe, assigning its id and timestamps.
    ///
    /// Fails with [`StoreError::DuplicateTitle`] if the title is taken.
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe>;

    /// All recipes in the store's natural (creation) order.
    async fn find(&self) -> Result<Vec<Recipe>>;

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>>;

    /// Apply `patch` and return the record as it is after the update, or
    /// `None` if no recipe has that id.
    async fn find_by_id_and_update(
        &self,
        id: &RecipeId,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>>;

    /// Permanently remove a recipe, returning what was removed.
    async fn find_by_id_and_delete(&self, id: &RecipeId) -> Result<Option<Recipe>>;

    /// Make every acknowledged write durable. Called once on shutdown.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Open the backend named by `target`.
pub fn open(target: &StoreTarget) -> Result<Arc<dyn RecipeStore>> {
    match target {
        StoreTarget::Memory => {
            info!("Using in-memory recipe store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreTarget::Fjall(path) => Ok(Arc::new(FjallStore::open(path)?)),
    }
}
