//! Error types for the doccheck API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use compliance_agent::PipelineError;
use session_store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Pipeline(e) => match e {
                PipelineError::Validation(inner) => (StatusCode::BAD_REQUEST, inner.to_string()),
                PipelineError::Extraction(inner) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, inner.to_string())
                }
                PipelineError::Analysis(inner) => {
                    tracing::error!("analysis failed: {}", inner);
                    (StatusCode::BAD_GATEWAY, e.to_string())
                }
                PipelineError::ProviderTimeout => {
                    tracing::error!("AI provider timed out");
                    (StatusCode::GATEWAY_TIMEOUT, e.to_string())
                }
                PipelineError::Store(StoreError::NotFound(_)) => {
                    (StatusCode::NOT_FOUND, e.to_string())
                }
                PipelineError::Store(StoreError::InvalidState { .. })
                | PipelineError::Store(StoreError::Conflict(_)) => {
                    (StatusCode::CONFLICT, e.to_string())
                }
            },
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
