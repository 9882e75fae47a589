use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
};
use tracing::{debug, info};

use super::{
    error::{Action, ApiError},
    models::{HealthResponse, RecipeResponse},
    state::AppState,
    utils::read_json,
};
use crate::recipes::{Recipe, RecipeId, validate_for_create, validate_for_update};

/// Create endpoint (POST /recipes)
///
/// ## Flow:
/// 1. Check Content-Type, read the body within `server.max_body_bytes`
/// 2. Validate and apply defaults (no store access on failure)
/// 3. Insert; the store assigns id and timestamps and rejects a taken title
/// 4. Return 201 with the stored record
pub async fn create_recipe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = tracked(&state, create(&state, &headers, body).await)?;
    state.metrics.recipe_created();
    info!(id = %recipe.id, title = %recipe.title, "Recipe created");

    let response = RecipeResponse::new("Recipe successfully created!", recipe);
    Ok((StatusCode::CREATED, Json(response)))
}

async fn create(
    state: &AppState,
    headers: &HeaderMap,
    body: axum::body::Body,
) -> Result<Recipe, ApiError> {
    const ACTION: Action = Action::Create;

    let input = read_json(headers, body, state.max_body_bytes())
        .await
        .map_err(|e| ApiError::payload(ACTION, e))?;
    let new_recipe = validate_for_create(&input).map_err(|e| ApiError::validation(ACTION, e))?;

    state
        .store
        .create(new_recipe)
        .await
        .map_err(|e| ApiError::store(ACTION, e))
}

/// List endpoint (GET /recipes)
///
/// Archived recipes are included; order is the store's natural order.
pub async fn list_recipes(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .store
        .find()
        .await
        .map_err(|e| ApiError::store(Action::List, e));
    let recipes = tracked(&state, result)?;

    Ok((StatusCode::OK, Json(recipes)))
}

/// Fetch endpoint (GET /recipes/{id})
///
/// A malformed id cannot match any record, so it is reported as not found.
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = tracked(&state, get(&state, &id).await)?;

    let response = RecipeResponse::new("Recipe successfully retrieved!", recipe);
    Ok((StatusCode::OK, Json(response)))
}

async fn get(state: &AppState, raw_id: &str) -> Result<Recipe, ApiError> {
    let id = RecipeId::parse(raw_id).ok_or(ApiError::NotFound)?;

    state
        .store
        .find_by_id(&id)
        .await
        .map_err(|e| ApiError::store(Action::Get, e))?
        .ok_or(ApiError::NotFound)
}

/// Update endpoint (PUT /recipes/{id})
///
/// The body is a partial recipe. It is validated in full before the store is
/// touched; `id` and the timestamps in the body are ignored.
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = tracked(&state, update(&state, &id, &headers, body).await)?;
    state.metrics.recipe_updated();
    info!(id = %recipe.id, "Recipe updated");

    let response = RecipeResponse::new("Recipe successfully updated!", recipe);
    Ok((StatusCode::OK, Json(response)))
}

async fn update(
    state: &AppState,
    raw_id: &str,
    headers: &HeaderMap,
    body: axum::body::Body,
) -> Result<Recipe, ApiError> {
    const ACTION: Action = Action::Update;

    let id = RecipeId::parse(raw_id).ok_or(ApiError::NotFound)?;
    let input = read_json(headers, body, state.max_body_bytes())
        .await
        .map_err(|e| ApiError::payload(ACTION, e))?;
    let patch = validate_for_update(&input).map_err(|e| ApiError::validation(ACTION, e))?;
    if patch.is_empty() {
        debug!(%id, "Update carries no fields, only updatedAt changes");
    }

    state
        .store
        .find_by_id_and_update(&id, patch)
        .await
        .map_err(|e| ApiError::store(ACTION, e))?
        .ok_or(ApiError::NotFound)
}

/// Delete endpoint (DELETE /recipes/{id})
///
/// Deletion is permanent. Deleting an id twice yields 404 the second time.
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = tracked(&state, delete(&state, &id).await)?;
    state.metrics.recipe_deleted();
    info!(id = %recipe.id, "Recipe deleted");

    Ok(StatusCode::NO_CONTENT)
}

async fn delete(state: &AppState, raw_id: &str) -> Result<Recipe, ApiError> {
    let id = RecipeId::parse(raw_id).ok_or(ApiError::NotFound)?;

    state
        .store
        .find_by_id_and_delete(&id)
        .await
        .map_err(|e| ApiError::store(Action::Delete, e))?
        .ok_or(ApiError::NotFound)
}

fn tracked<T>(state: &AppState, result: Result<T, ApiError>) -> Result<T, ApiError> {
    if result.is_err() {
        state.metrics.request_failed();
    }
    result
}

/// Landing page (GET /)
pub async fn index() -> impl IntoResponse {
    Html("<h1>Recipebox | Recipes API</h1>")
}

/// Health check endpoint (GET /health)
pub async fn health() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
