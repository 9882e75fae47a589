//! Recipe entity and the validation rules applied before any write.
//!
//! Handlers never persist raw request bodies. A body is first turned into a
//! [`NewRecipe`] (create) or a [`RecipePatch`] (update) by
//! [`validate_for_create`] / [`validate_for_update`], and only those typed
//! values reach a [`crate::store::RecipeStore`].

mod model;
mod validation;

pub use model::{DEFAULT_IMAGE, Level, NewRecipe, Recipe, RecipeId, RecipePatch};
pub use validation::{ValidationErrors, Violation, validate_for_create, validate_for_update};
