//! Response bodies for the recipe endpoints.
//!
//! Request bodies are deliberately untyped (`serde_json::Value`) at this
//! layer: they are handed to [`crate::recipes::validate_for_create`] and
//! [`crate::recipes::validate_for_update`], which report every violation
//! instead of failing on the first serde error.
//!
//! Shapes on the wire:
//!
//! ```json
//! { "message": "Recipe successfully created!", "recipe": { "id": "…", "title": "…" } }
//! { "message": "Error creating recipe", "error": "Recipe validation failed: `title` is required" }
//! { "message": "Recipe not found" }
//! ```

use serde::{Deserialize, Serialize};

use crate::recipes::Recipe;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecipeResponse {
    pub message: String,
    pub recipe: Recipe,
}

impl RecipeResponse {
    pub fn new(message: &str, recipe: Recipe) -> Self {
        Self {
            message: message.to_string(),
            recipe,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
