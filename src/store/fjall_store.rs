use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::recipes::{NewRecipe, Recipe, RecipeId, RecipePatch};

use super::RecipeStore;
use super::error::{Result, StoreError};
use super::keys::{decode_recipe_key, encode_recipe_key, encode_title_key};

/// Fjall-backed persistent storage for recipes
///
/// Records live in the `recipes` partition; the `titles` partition is the
/// unique index on `title`. Writers hold `write_lock` so the uniqueness check
/// and the batch that follows it cannot interleave with another writer.
#[derive(Clone)]
pub struct FjallStore {
    keyspace: Keyspace,
    recipes: PartitionHandle,
    titles: PartitionHandle,
    write_lock: Arc<Mutex<()>>,
}

impl FjallStore {
    /// Open or create a Fjall store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening Fjall store at: {}", path.display());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let recipes = keyspace.open_partition("recipes", PartitionCreateOptions::default())?;
        let titles = keyspace.open_partition("titles", PartitionCreateOptions::default())?;

        info!("Fjall store opened successfully");
        Ok(Self {
            keyspace,
            recipes,
            titles,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn load(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        match self.recipes.get(encode_recipe_key(id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn title_owner(&self, title: &str) -> Result<Option<RecipeId>> {
        match self.titles.get(encode_title_key(title))? {
            Some(value) => {
                let raw = String::from_utf8_lossy(&value);
                let id = raw
                    .parse()
                    .map_err(|_| StoreError::InvalidKey(format!("title index value {raw}")))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Persist all pending writes to disk
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Get internal statistics (for debugging/monitoring)
    pub fn stats(&self) -> Result<StoreStats> {
        let mut recipe_count = 0;
        let mut title_count = 0;

        for item in self.recipes.iter() {
            item?;
            recipe_count += 1;
        }

        for item in self.titles.iter() {
            item?;
            title_count += 1;
        }

        Ok(StoreStats {
            recipe_count,
            title_count,
        })
    }
}

#[async_trait]
impl RecipeStore for FjallStore {
    async fn create(&self, recipe: NewRecipe) -> Result<Recipe> {
        let _guard = self.write_lock.lock().await;

        if self.title_owner(&recipe.title)?.is_some() {
            return Err(StoreError::DuplicateTitle(recipe.title));
        }

        let recipe = Recipe::from_new(RecipeId::new(), recipe, Utc::now());
        let value = serde_json::to_vec(&recipe)?;

        let mut batch = self.keyspace.batch();
        batch.insert(&self.recipes, encode_recipe_key(&recipe.id), value);
        batch.insert(
            &self.titles,
            encode_title_key(&recipe.title),
            recipe.id.to_string().into_bytes(),
        );
        batch.commit()?;

        debug!(id = %recipe.id, "Created recipe");
        Ok(recipe)
    }

    async fn find(&self) -> Result<Vec<Recipe>> {
        let mut recipes = Vec::new();
        for item in self.recipes.iter() {
            let (key, value) = item?;
            if decode_recipe_key(&key).is_none() {
                return Err(StoreError::InvalidKey(
                    String::from_utf8_lossy(&key).into_owned(),
                ));
            }
            recipes.push(serde_json::from_slice(&value)?);
        }
        Ok(recipes)
    }

    async fn find_by_id(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        self.load(id)
    }

    async fn find_by_id_and_update(
        &self,
        id: &RecipeId,
        patch: RecipePatch,
    ) -> Result<Option<Recipe>> {
        let _guard = self.write_lock.lock().await;

        let Some(mut recipe) = self.load(id)? else {
            return Ok(None);
        };
        let previous_title = recipe.title.clone();

        patch.apply_to(&mut recipe);
        let title_changed = recipe.title != previous_title;
        if title_changed {
            if let Some(owner) = self.title_owner(&recipe.title)? {
                if owner != *id {
                    return Err(StoreError::DuplicateTitle(recipe.title));
                }
            }
        }
        recipe.updated_at = Utc::now();

        let mut batch = self.keyspace.batch();
        batch.insert(&self.recipes, encode_recipe_key(id), serde_json::to_vec(&recipe)?);
        if title_changed {
            batch.remove(&self.titles, encode_title_key(&previous_title));
            batch.insert(
                &self.titles,
                encode_title_key(&recipe.title),
                id.to_string().into_bytes(),
            );
        }
        batch.commit()?;

        debug!(%id, "Updated recipe");
        Ok(Some(recipe))
    }

    async fn find_by_id_and_delete(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        let _guard = self.write_lock.lock().await;

        let Some(recipe) = self.load(id)? else {
            return Ok(None);
        };

        let mut batch = self.keyspace.batch();
        batch.remove(&self.recipes, encode_recipe_key(id));
        batch.remove(&self.titles, encode_title_key(&recipe.title));
        batch.commit()?;

        debug!(%id, "Deleted recipe");
        Ok(Some(recipe))
    }

    async fn flush(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.persist()?;
        info!("Fjall store flushed to disk");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StoreStats {
    pub recipe_count: usize,
    pub title_count: usize,
}
