//! # Warehouse Errors

use thiserror::Error;

use crate::query::QueryError;

/// Result type for warehouse operations
pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// Warehouse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarehouseError {
    /// Could not connect or the connection dropped
    #[error("Connection error: {0}")]
    Connection(String),

    /// Credentials lack a required privilege
    #[error("Permission denied: {0}")]
    Permission(String),

    /// The database rejected the statement
    #[error("Query error: {0}")]
    Query(String),
}

impl WarehouseError {
    /// Get error code
    pub fn code(&self) -> &'static str {
        match self {
            WarehouseError::Connection(_) => "WAREHOUSE_CONNECTION",
            WarehouseError::Permission(_) => "WAREHOUSE_PERMISSION",
            WarehouseError::Query(_) => "WAREHOUSE_QUERY",
        }
    }

    /// Underlying message without the category prefix
    pub fn message(&self) -> &str {
        match self {
            WarehouseError::Connection(m)
            | WarehouseError::Permission(m)
            | WarehouseError::Query(m) => m,
        }
    }
}

impl From<WarehouseError> for QueryError {
    fn from(err: WarehouseError) -> Self {
        QueryError::execution_failure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryErrorKind, Stage};

    #[test]
    fn test_into_query_error() {
        let err: QueryError = WarehouseError::Permission("table gbads_comments".into()).into();
        assert_eq!(err.kind(), QueryErrorKind::ExecutionFailure);
        assert_eq!(err.stage(), Stage::Execute);
        assert!(err.reason().contains("gbads_comments"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(WarehouseError::Query("x".into()).code(), "WAREHOUSE_QUERY");
        assert_eq!(WarehouseError::Connection("refused".into()).message(), "refused");
    }
}
