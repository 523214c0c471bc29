//! Axum router — maps URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    health::health,
    trivia::trivia_submit,
};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/api/trivia", post(trivia_submit))
        .route("/health",     get(health))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
