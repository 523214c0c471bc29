use axum::{extract::State, Json};
use serde::Serialize;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub port: u16,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthStatus> {
    Json(HealthStatus { status: "Server running", port: state.port })
}
