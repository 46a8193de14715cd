use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::dto::{
    AdvancedAnalytics, BasicAnalytics, PredictionsResponse, TrendsQuery, TrendsResponse,
};
use super::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/basic", get(basic_analytics))
        .route("/api/analytics/advanced", get(advanced_analytics))
        .route("/api/analytics/trends", get(trends))
        .route("/api/analytics/predictions", get(predictions))
}

#[instrument(skip(state))]
pub async fn basic_analytics(State(state): State<AppState>) -> Json<BasicAnalytics> {
    Json(services::basic(&state.gateway).await)
}

#[instrument(skip(state))]
pub async fn advanced_analytics(State(state): State<AppState>) -> ApiResult<Json<AdvancedAnalytics>> {
    if !state.capabilities.advanced_analytics {
        return Err(ApiError::Unavailable {
            message: "advanced analytics are not enabled in this deployment".into(),
            fallback: "Use /api/analytics/basic for analytics without the advanced capability".into(),
        });
    }
    let stats = services::advanced(&state.gateway).await?;
    Ok(Json(AdvancedAnalytics {
        success: true,
        stats,
        timestamp: services::timestamp(),
    }))
}

#[instrument(skip(state))]
pub async fn trends(
    State(state): State<AppState>,
    Query(q): Query<TrendsQuery>,
) -> Json<TrendsResponse> {
    Json(services::trends(&state.gateway, q.period).await)
}

#[instrument(skip(state))]
pub async fn predictions(State(state): State<AppState>) -> ApiResult<Json<PredictionsResponse>> {
    let predictions =
        services::predictions(&state.gateway, state.capabilities.advanced_analytics).await?;
    Ok(Json(PredictionsResponse {
        success: true,
        predictions,
    }))
}
