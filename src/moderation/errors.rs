//! # Moderation Errors

use thiserror::Error;

use crate::query::QueryError;
use crate::warehouse::WarehouseError;

/// Result type for moderation operations
pub type ModerationResult<T> = Result<T, ModerationError>;

/// Moderation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    // Request errors
    #[error("Invalid comment id: {0}")]
    InvalidId(String),

    #[error("Invalid comment: {0}")]
    InvalidComment(String),

    // Authorization errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Object store errors
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(String),

    // Downstream
    #[error("Warehouse error: {0}")]
    Warehouse(String),

    #[error("Comments table does not match: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ModerationError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ModerationError::InvalidId(_) => 400,
            ModerationError::InvalidComment(_) => 400,
            ModerationError::Unauthorized(_) => 401,
            ModerationError::Forbidden(_) => 403,
            ModerationError::ObjectNotFound(_) => 404,
            ModerationError::InvalidKey(_) => 400,
            ModerationError::Io(_) => 500,
            ModerationError::Warehouse(_) => 502,
            ModerationError::Schema(_) => 500,
            ModerationError::Config(_) => 500,
        }
    }

    /// Get error code
    pub fn code(&self) -> &'static str {
        match self {
            ModerationError::InvalidId(_) => "INVALID_ID",
            ModerationError::InvalidComment(_) => "INVALID_COMMENT",
            ModerationError::Unauthorized(_) => "UNAUTHORIZED",
            ModerationError::Forbidden(_) => "FORBIDDEN",
            ModerationError::ObjectNotFound(_) => "OBJECT_NOT_FOUND",
            ModerationError::InvalidKey(_) => "INVALID_KEY",
            ModerationError::Io(_) => "STORAGE_IO",
            ModerationError::Warehouse(_) => "WAREHOUSE_ERROR",
            ModerationError::Schema(_) => "SCHEMA_MISMATCH",
            ModerationError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<WarehouseError> for ModerationError {
    fn from(err: WarehouseError) -> Self {
        ModerationError::Warehouse(err.to_string())
    }
}

/// Query errors only arise while building the comment insert
impl From<QueryError> for ModerationError {
    fn from(err: QueryError) -> Self {
        ModerationError::Schema(err.reason().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Stage;

    #[test]
    fn test_status_codes() {
        assert_eq!(ModerationError::InvalidId("..".into()).status_code(), 400);
        assert_eq!(ModerationError::Unauthorized("bad".into()).status_code(), 401);
        assert_eq!(ModerationError::ObjectNotFound("x".into()).status_code(), 404);
        assert_eq!(ModerationError::Io("disk".into()).status_code(), 500);
        assert_eq!(ModerationError::Warehouse("down".into()).status_code(), 502);
    }

    #[test]
    fn test_from_query_error() {
        let err: ModerationError =
            QueryError::unknown_column_in(Stage::Build, "gbads_comments", "reviewer").into();
        assert_eq!(err.code(), "SCHEMA_MISMATCH");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_from_warehouse() {
        let err: ModerationError = WarehouseError::Connection("refused".into()).into();
        assert_eq!(err.code(), "WAREHOUSE_ERROR");
        assert!(err.to_string().contains("refused"));
    }
}
