pub mod request_id;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::controllers::{clone::CloneController, health};
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use request_id::request_id_middleware;

/// Samples above 5MB are discouraged but not rejected; the limit only guards
/// against unbounded bodies.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build the application router with all routes configured
pub fn build_router(pool: Arc<DbPool>, clone_controller: Arc<CloneController>) -> Router {
    // Voice clone routes (public - the demo has no auth)
    let voice_routes = Router::new()
        .route("/api/voice/clone", post(CloneController::clone_voice))
        .route("/api/voice/history", get(CloneController::list_history))
        .with_state(clone_controller)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .merge(voice_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    clone_controller: Arc<CloneController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(pool, clone_controller);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
