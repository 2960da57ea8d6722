//! # HTTP API Errors

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::moderation::ModerationError;
use crate::query::{QueryError, QueryErrorKind};

/// Result type for HTTP handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Query engine failure
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Moderation failure
    #[error("{0}")]
    Moderation(#[from] ModerationError),

    /// Missing required parameter
    #[error("Missing required parameter: {0}")]
    MissingParam(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Query(err) => match err.kind() {
                QueryErrorKind::UnknownTable => StatusCode::NOT_FOUND,
                QueryErrorKind::ExecutionFailure => StatusCode::BAD_GATEWAY,
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::Moderation(err) => {
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::MissingParam(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Query(err) => err.kind().code(),
            ApiError::Moderation(err) => err.code(),
            ApiError::MissingParam(_) => "MISSING_PARAMETER",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
    /// Engine stage, for query errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let error = match &err {
            ApiError::Query(q) => q.reason().to_string(),
            other => other.to_string(),
        };
        Self {
            code: err.status_code().as_u16(),
            kind: err.kind(),
            stage: match &err {
                ApiError::Query(q) => Some(q.stage().as_str()),
                _ => None,
            },
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
