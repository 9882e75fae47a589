use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use futures_util::{StreamExt, stream};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use async_trait::async_trait;
use recipebox::api::models::RecipeResponse;
use recipebox::api::state::AppState;
use recipebox::config::Config;
use recipebox::recipes::{DEFAULT_IMAGE, Level, NewRecipe, Recipe, RecipeId, RecipePatch};
use recipebox::store::{FjallStore, MemoryStore, RecipeStore, StoreError};

/// Creates a minimal config for testing, bypassing file-based loading
fn create_test_config() -> Config {
    let config_toml = r#"
[server]
bind_addr = "127.0.0.1:3000"
max_body_bytes = "4KB"

[store]
uri = "memory://"
    "#;

    toml::from_str(config_toml).expect("Failed to parse test config")
}

fn build_app_with_store(store: Arc<dyn RecipeStore>) -> (Router, AppState) {
    let state = AppState::new(create_test_config(), store);
    (recipebox::api::router(state.clone()), state)
}

fn build_test_app() -> (Router, AppState) {
    build_app_with_store(Arc::new(MemoryStore::new()))
}

/// Store double whose every operation fails like a lost connection
struct UnavailableStore;

#[async_trait]
impl RecipeStore for UnavailableStore {
    async fn create(&self, _recipe: NewRecipe) -> recipebox::store::Result<Recipe> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find(&self) -> recipebox::store::Result<Vec<Recipe>> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find_by_id(&self, _id: &RecipeId) -> recipebox::store::Result<Option<Recipe>> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find_by_id_and_update(
        &self,
        _id: &RecipeId,
        _patch: RecipePatch,
    ) -> recipebox::store::Result<Option<Recipe>> {
        Err(StoreError::Backend("connection refused".to_string()))
    }

    async fn find_by_id_and_delete(
        &self,
        _id: &RecipeId,
    ) -> recipebox::store::Result<Option<Recipe>> {
        Err(StoreError::Backend("connection refused".to_string()))
    }
}

fn valid_recipe() -> Value {
    json!({
        "title": "Carbonara",
        "instructions": "Cook pasta. Mix eggs and cheese. Combine off the heat.",
        "level": "Amateur Chef",
        "ingredients": ["spaghetti", "eggs", "pecorino", "guanciale", "eggs"],
        "duration": 25
    })
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(method)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn create(app: &Router, body: &Value) -> Recipe {
    let (status, body) = send(app, json_request("POST", "/recipes", body)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    let response: RecipeResponse = serde_json::from_value(body).unwrap();
    response.recipe
}

async fn list(app: &Router) -> Vec<Recipe> {
    let (status, body) = send(app, empty_request("GET", "/recipes")).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_create_recipe_success() {
    let (app, _state) = build_test_app();

    let (status, body) = send(&app, json_request("POST", "/recipes", &valid_recipe())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Recipe successfully created!");
    assert_eq!(body["recipe"]["duration"], json!(25));

    let recipe: Recipe = serde_json::from_value(body["recipe"].clone()).unwrap();
    assert_eq!(recipe.title, "Carbonara");
    assert_eq!(
        recipe.instructions,
        "Cook pasta. Mix eggs and cheese. Combine off the heat."
    );
    assert_eq!(recipe.level, Some(Level::AmateurChef));
    assert_eq!(
        recipe.ingredients,
        vec!["spaghetti", "eggs", "pecorino", "guanciale", "eggs"]
    );
    assert_eq!(recipe.duration, Some(25.0));
    assert_eq!(recipe.image, DEFAULT_IMAGE);
    assert!(!recipe.is_archived);
    assert!(!recipe.id.to_string().is_empty());
}

#[tokio::test]
async fn test_create_ignores_client_identity_and_timestamps() {
    let (app, _state) = build_test_app();

    let mut body = valid_recipe();
    body["id"] = json!("0192f6d2-0000-7000-8000-000000000000");
    body["created"] = json!("1999-01-01T00:00:00Z");

    let recipe = create(&app, &body).await;
    assert_ne!(recipe.id.to_string(), "0192f6d2-0000-7000-8000-000000000000");
    assert!(recipe.created.timestamp() > 946_684_800);
}

#[tokio::test]
async fn test_create_duplicate_title_conflicts() {
    let (app, _state) = build_test_app();
    let first = create(&app, &valid_recipe()).await;

    let (status, body) = send(&app, json_request("POST", "/recipes", &valid_recipe())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Error creating recipe");
    assert!(body["error"].as_str().unwrap().contains("Carbonara"));

    let all = list(&app).await;
    assert_eq!(all, vec![first]);
}

#[tokio::test]
async fn test_create_rejects_unknown_level() {
    let (app, _state) = build_test_app();

    let mut body = valid_recipe();
    body["level"] = json!("Gourmet");

    let (status, body) = send(&app, json_request("POST", "/recipes", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Error creating recipe");
    assert!(body["error"].as_str().unwrap().contains("Gourmet"));
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn test_create_rejects_negative_duration() {
    let (app, state) = build_test_app();

    let mut body = valid_recipe();
    body["duration"] = json!(-5);

    let (status, _) = send(&app, json_request("POST", "/recipes", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(list(&app).await.is_empty());
    assert_eq!(state.metrics.snapshot().recipes_created, 0);
    assert_eq!(state.metrics.snapshot().requests_failed, 1);
}

#[tokio::test]
async fn test_create_requires_title_and_instructions() {
    let (app, _state) = build_test_app();

    let (status, body) = send(&app, json_request("POST", "/recipes", &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("title"));
    assert!(error.contains("instructions"));
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let (app, _state) = build_test_app();

    let request = Request::builder()
        .uri("/recipes")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": \"Soup\""))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Error creating recipe");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_rejects_wrong_content_type() {
    let (app, _state) = build_test_app();

    let request = Request::builder()
        .uri("/recipes")
        .method("POST")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(serde_json::to_string(&valid_recipe()).unwrap()))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_rejects_oversized_body() {
    let (app, _state) = build_test_app();

    let mut body = valid_recipe();
    body["instructions"] = json!("stir ".repeat(2000));

    let (status, _) = send(&app, json_request("POST", "/recipes", &body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn test_create_stops_reading_streamed_body_over_limit() {
    let (app, _state) = build_test_app();

    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = pulled.clone();
    let chunks = stream::iter(0..1024).map(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, std::io::Error>(Bytes::from(vec![b' '; 64 * 1024]))
    });
    let request = Request::builder()
        .uri("/recipes")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from_stream(chunks))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["message"], "Error creating recipe");
    assert!(pulled.load(Ordering::SeqCst) <= 2);
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn test_update_rejects_declared_length_over_limit() {
    let (app, _state) = build_test_app();
    let recipe = create(&app, &valid_recipe()).await;

    let request = Request::builder()
        .uri(format!("/recipes/{}", recipe.id))
        .method("PUT")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, "1048576")
        .body(Body::from_stream(stream::empty::<Result<Bytes, std::io::Error>>()))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_get_recipe_returns_created_record() {
    let (app, _state) = build_test_app();
    let created = create(&app, &valid_recipe()).await;

    let (status, body) = send(&app, empty_request("GET", &format!("/recipes/{}", created.id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Recipe successfully retrieved!");

    let fetched: Recipe = serde_json::from_value(body["recipe"].clone()).unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_get_unknown_and_malformed_ids_are_not_found() {
    let (app, _state) = build_test_app();

    let (status, body) =
        send(&app, empty_request("GET", &format!("/recipes/{}", RecipeId::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Recipe not found"}));

    let (status, body) = send(&app, empty_request("GET", "/recipes/not-an-id")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Recipe not found"}));
}

#[tokio::test]
async fn test_update_recipe_duration() {
    let (app, state) = build_test_app();
    let created = create(&app, &valid_recipe()).await;
    let uri = format!("/recipes/{}", created.id);

    let (status, body) = send(&app, json_request("PUT", &uri, &json!({"duration": 45}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Recipe successfully updated!");
    assert_eq!(body["recipe"]["duration"].as_f64(), Some(45.0));

    let (_, body) = send(&app, empty_request("GET", &uri)).await;
    let fetched: Recipe = serde_json::from_value(body["recipe"].clone()).unwrap();
    assert_eq!(fetched.duration, Some(45.0));
    assert_eq!(fetched.title, created.title);
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.created, created.created);
    assert!(fetched.updated_at >= created.updated_at);
    assert_eq!(state.metrics.snapshot().recipes_updated, 1);
}

#[tokio::test]
async fn test_update_cannot_overwrite_id_or_created() {
    let (app, _state) = build_test_app();
    let created = create(&app, &valid_recipe()).await;
    let uri = format!("/recipes/{}", created.id);

    let patch = json!({
        "id": RecipeId::new().to_string(),
        "created": "2001-01-01T00:00:00Z",
        "isArchived": true
    });
    let (status, body) = send(&app, json_request("PUT", &uri, &patch)).await;
    assert_eq!(status, StatusCode::OK);

    let updated: Recipe = serde_json::from_value(body["recipe"].clone()).unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created, created.created);
    assert!(updated.is_archived);
}

#[tokio::test]
async fn test_update_with_invalid_field_changes_nothing() {
    let (app, _state) = build_test_app();
    let created = create(&app, &valid_recipe()).await;
    let uri = format!("/recipes/{}", created.id);

    let (status, body) = send(
        &app,
        json_request("PUT", &uri, &json!({"title": "Renamed", "duration": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Error updating the recipe");

    let (_, body) = send(&app, empty_request("GET", &uri)).await;
    let fetched: Recipe = serde_json::from_value(body["recipe"].clone()).unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let (app, _state) = build_test_app();

    let uri = format!("/recipes/{}", RecipeId::new());
    let (status, body) = send(&app, json_request("PUT", &uri, &json!({"duration": 5}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Recipe not found"}));

    let (status, _) = send(&app, json_request("PUT", "/recipes/123", &json!({"duration": 5}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_to_existing_title_conflicts() {
    let (app, _state) = build_test_app();
    create(&app, &valid_recipe()).await;
    let other = create(
        &app,
        &json!({"title": "Cacio e Pepe", "instructions": "Pasta, cheese, pepper."}),
    )
    .await;

    let uri = format!("/recipes/{}", other.id);
    let (status, body) = send(&app, json_request("PUT", &uri, &json!({"title": "Carbonara"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Error updating the recipe");
}

#[tokio::test]
async fn test_delete_recipe_then_not_found() {
    let (app, state) = build_test_app();
    let created = create(&app, &valid_recipe()).await;
    let uri = format!("/recipes/{}", created.id);

    let response = app.clone().oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    let (status, _) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"message": "Recipe not found"}));

    assert_eq!(state.metrics.snapshot().recipes_deleted, 1);
}

#[tokio::test]
async fn test_list_returns_every_recipe_including_archived() {
    let (app, _state) = build_test_app();

    for n in 0..4 {
        create(
            &app,
            &json!({
                "title": format!("Recipe {n}"),
                "instructions": "Do the thing.",
                "isArchived": n % 2 == 0
            }),
        )
        .await;
    }

    let all = list(&app).await;
    assert_eq!(all.len(), 4);
    assert_eq!(all.iter().filter(|r| r.is_archived).count(), 2);
}

#[tokio::test]
async fn test_store_failures_are_reported_as_500() {
    let (app, state) = build_app_with_store(Arc::new(UnavailableStore));
    let uri = format!("/recipes/{}", RecipeId::new());

    let (status, body) = send(&app, json_request("POST", "/recipes", &valid_recipe())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"message": "Error creating recipe", "error": "connection refused"})
    );

    let (status, body) = send(&app, empty_request("GET", "/recipes")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error fetching recipes");

    let (status, body) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error retrieving the recipe");

    let (status, body) = send(&app, json_request("PUT", &uri, &json!({"duration": 1}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error updating the recipe");

    let (status, body) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "connection refused");

    assert_eq!(state.metrics.snapshot().requests_failed, 5);
}

#[tokio::test]
async fn test_validation_runs_before_store() {
    // An unavailable store would answer 500; an invalid body must never get that far
    let (app, _state) = build_app_with_store(Arc::new(UnavailableStore));

    let (status, _) = send(&app, json_request("POST", "/recipes", &json!({"title": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crud_against_fjall_store() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = FjallStore::open(temp_dir.path().join("recipes.fjall"))
        .expect("Failed to open test Fjall store");
    let (app, _state) = build_app_with_store(Arc::new(store));

    let created = create(&app, &valid_recipe()).await;
    let uri = format!("/recipes/{}", created.id);

    let (status, _) = send(&app, json_request("PUT", &uri, &json!({"level": "UltraPro Chef"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(body["recipe"]["level"], "UltraPro Chef");
    assert_eq!(list(&app).await.len(), 1);

    let (status, _) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn test_health_and_index() {
    let (app, _state) = build_test_app();

    let (status, body) = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let response = app.clone().oneshot(empty_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("<h1>"));
}
