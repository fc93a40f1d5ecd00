//! API Routes
//!
//! Configures the Axum router with all static server endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, scan_handler, set_enabled_handler, static_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /static/*path` - Serve a static file
/// - `GET /stats` - Get cache statistics
/// - `POST /cache/scan` - Queue a reconciliation scan
/// - `PUT /cache/enabled` - Turn the cache on or off
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Static assets may be loaded from any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/static/*path", get(static_handler))
        .route("/stats", get(stats_handler))
        .route("/cache/scan", post(scan_handler))
        .route("/cache/enabled", put(set_enabled_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
