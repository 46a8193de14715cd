//! Error type for the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// An optional capability is not available in this deployment.
    #[error("{message}")]
    Unavailable {
        message: String,
        fallback: String,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Unavailable { message, fallback } => json!({
                "success": false,
                "error": message,
                "fallback": fallback,
            }),
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "request failed");
                json!({
                    "success": false,
                    "error": e.to_string(),
                })
            }
        };
        (status, Json(body)).into_response()
    }
}
