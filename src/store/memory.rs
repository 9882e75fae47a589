use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::recipes::{NewRecipe, Recipe, RecipeId, RecipePatch};

use super::RecipeStore;
use super::error::{Result, StoreError};

/// In-memory recipe store. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    recipes: RwLock<BTreeMap<RecipeId, Recipe>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.recipes.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.recipes.read().await.is_empty()
    }
}

fn title_taken(recipes: &BTreeMap<RecipeId, Recipe>, title: &str, except: Option<&RecipeId>) -> bool {
    recipes
        .values()
        .any(|recipe| recipe.title == title && Some(&recipe.id) != except)
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe> {
        let mut recipes = self.recipes.write().await;

        if title_taken(&recipes, &recipe.title, None) {
            return Err(StoreError::DuplicateTitle(recipe.title));
        }

        let recipe = Recipe::from_new(RecipeId::new(), recipe, Utc::now());
        recipes.insert(recipe.id, recipe.clone());

        debug!(id = %recipe.id, "Created recipe");
        Ok(recipe)
    }

    async fn find(&self) -> Result<Vec<Recipe>> {
        Ok(self.recipes.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        Ok(self.recipes.read().await.get(id).cloned())
    }

    async fn find_by_id_and_update(
        &self,
        id: &RecipeId,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>> {
        let mut recipes = self.recipes.write().await;

        let Some(current) = recipes.get(id) else {
            return Ok(None);
        };

        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        if title_taken(&recipes, &updated.title, Some(id)) {
            return Err(StoreError::DuplicateTitle(updated.title));
        }
        updated.updated_at = Utc::now();
        recipes.insert(*id, updated.clone());

        debug!(%id, "Updated recipe");
        Ok(Some(updated))
    }

    async fn find_by_id_and_delete(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        let removed = self.recipes.write().await.remove(id);
        if removed.is_some() {
            debug!(%id, "Deleted recipe");
        }
        Ok(removed)
    }
}
