use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::analytics::{dto::HealthResponse, services::timestamp};
use crate::db::{ProbeResult, Target};
use crate::state::AppState;

pub const SERVICE_NAME: &str = "Battle.net Analytics Service";

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/db/status", get(db_status))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        service: SERVICE_NAME,
        timestamp: timestamp(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[instrument(skip(state))]
pub async fn db_status(State(state): State<AppState>) -> Json<ProbeResult> {
    Json(state.gateway.test_connection(Target::Application).await)
}
