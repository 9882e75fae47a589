use axum::{
    Router,
    extract::MatchedPath,
    http::Request,
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{create_recipe, delete_recipe, get_recipe, health, index, list_recipes, update_recipe},
    state::AppState,
};
use crate::config::Config;
use crate::store;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Routes for the recipe API, without request logging.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .with_state(state)
        // Automatically decompress gzip request bodies
        .layer(RequestDecompressionLayer::new())
}

fn with_request_logging(app: Router) -> Router {
    app.layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
            let path = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str)
                .unwrap_or(request.uri().path());

            tracing::info_span!("http_request", method = %request.method(), path = %path)
        }),
    )
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let target = config.store_target()?;
    info!(?target, "Opening recipe store");
    let store =
        store::open(&target).map_err(|e| format!("Failed to open recipe store: {}", e))?;

    let address = config.server.bind_addr;
    let request_logging = config.telemetry.request_logging;
    let state = AppState::new(config, store.clone());

    let mut app = router(state);
    if request_logging {
        app = with_request_logging(app);
    }

    let listener = TcpListener::bind(address).await?;
    info!(%address, "Recipebox API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store
        .flush()
        .await
        .map_err(|e| format!("Failed to flush recipe store: {}", e))?;
    info!("Recipe store flushed, exiting");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
