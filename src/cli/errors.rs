//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use thiserror::Error;

use crate::moderation::ModerationError;
use crate::query::QueryError;
use crate::warehouse::WarehouseError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("{0}")]
    Query(#[from] QueryError),

    #[error("moderation error: {0}")]
    Moderation(#[from] ModerationError),
}

impl CliError {
    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "GBADS_CLI_CONFIG_ERROR",
            CliError::Io(_) => "GBADS_CLI_IO_ERROR",
            CliError::Warehouse(_) => "GBADS_CLI_WAREHOUSE_ERROR",
            CliError::Query(_) => "GBADS_CLI_QUERY_ERROR",
            CliError::Moderation(_) => "GBADS_CLI_MODERATION_ERROR",
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(format!("invalid config JSON: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
