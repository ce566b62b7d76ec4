//! API error types.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use wardrobe_client::BackendError;
use wardrobe_flow::FlowError;

pub type ApiResult<T> = Result<T, ApiError>;

static HIDE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

/// Whether 500 responses hide the underlying error text. Set from
/// [`ApiConfig::is_production`](crate::ApiConfig::is_production) when the
/// router is built.
pub fn hide_internal_details(hide: bool) {
    HIDE_INTERNAL_DETAILS.store(hide, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Another request for the same session is still in flight.
    #[error("{0}")]
    Busy(String),

    /// Blocked locally; nothing was sent to the backend.
    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Busy(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Backend(BackendError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Backend(e) if e.is_local() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Backend(e) if e.is_transport() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Busy(_) => "busy",
            ApiError::Validation(_) => "validation",
            ApiError::Internal(_) => "internal",
            ApiError::Backend(BackendError::Rejected(_)) => "backend_rejected",
            ApiError::Backend(e) if e.is_local() => "validation",
            ApiError::Backend(e) if e.is_transport() => "backend_unavailable",
            ApiError::Backend(_) => "backend_error",
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Busy(_) => ApiError::Busy(err.to_string()),
            FlowError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            FlowError::Backend(e) if e.is_local() => ApiError::Validation(e.user_message()),
            FlowError::Backend(e) => ApiError::Backend(e),
            FlowError::Io(e) => ApiError::Internal(e.to_string()),
            other => ApiError::Validation(other.user_message()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let detail = match &self {
            // Don't expose internal error details in production
            ApiError::Internal(_) if HIDE_INTERNAL_DETAILS.load(Ordering::Relaxed) => {
                "An internal error occurred".to_string()
            }
            ApiError::Backend(e) => e.user_message(),
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { detail, code })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardrobe_models::{PayloadError, SessionId};

    #[test]
    fn test_flow_error_mapping() {
        let id = SessionId::new();
        assert_eq!(
            ApiError::from(FlowError::Busy(id)).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(FlowError::SessionNotFound(id)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(FlowError::validation("Select at least one region")).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_backend_error_mapping() {
        let rejected = ApiError::from(FlowError::from(BackendError::rejected("No mask found")));
        assert_eq!(rejected.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejected.code(), "backend_rejected");

        let timeout = ApiError::from(BackendError::Timeout(30));
        assert_eq!(timeout.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let status = ApiError::from(BackendError::from_http_status(500, ""));
        assert_eq!(status.status_code(), StatusCode::BAD_GATEWAY);

        let payload = ApiError::from(FlowError::from(BackendError::from(PayloadError::Empty)));
        assert!(matches!(payload, ApiError::Validation(_)));
        assert_eq!(payload.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    async fn detail(err: ApiError) -> String {
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["detail"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_internal_detail_follows_config() {
        let io = || FlowError::Io(std::io::Error::other("disk full"));

        hide_internal_details(false);
        assert!(detail(ApiError::from(io())).await.contains("disk full"));

        hide_internal_details(
            crate::ApiConfig {
                environment: "Production".to_string(),
                ..Default::default()
            }
            .is_production(),
        );
        assert_eq!(detail(ApiError::from(io())).await, "An internal error occurred");

        hide_internal_details(false);
    }
}
