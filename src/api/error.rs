use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::dump::DumpError;

#[derive(Debug, Clone, Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize)]
struct ErrorPayload {
    code: &'static str,
    message: String,
}

/// Failure returned by a handler, rendered as `{"error": {"code", "message"}}`
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<DumpError> for ApiError {
    fn from(err: DumpError) -> Self {
        match err {
            DumpError::DatabaseMissing(_) | DumpError::Open(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "database_unavailable",
                err.to_string(),
            ),
            DumpError::Query { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "query_failed",
                err.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = ErrorEnvelope {
            error: ErrorPayload {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(payload)).into_response()
    }
}
