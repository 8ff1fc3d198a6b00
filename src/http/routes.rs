use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::http::state::AppState;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Load balancer probe
        .route("/health", get(handlers::health_check))
        .route("/", get(handlers::welcome))
        // Counter routes
        .route("/api/counter", get(handlers::get_counter))
        .route("/api/counter/increment", post(handlers::increment_counter))
        .route("/api/counter/reset", post(handlers::reset_counter))
        // Diagnostics
        .route("/api/stats", get(handlers::stats))
        .route("/api/load", get(handlers::synthetic_load))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
