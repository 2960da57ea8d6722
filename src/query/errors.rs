//! Query engine errors
//!
//! Every failure carries the stage it happened in, a kind from a fixed
//! taxonomy and a caller-facing reason. Reasons only ever name identifiers
//! the caller supplied; generated statement text never appears in them.

use std::fmt;

use thiserror::Error;

/// Processing stage at which a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request validation (table, format, wire parameters)
    Validate,
    /// Join resolution
    Join,
    /// Filter parsing
    Parse,
    /// Ordering resolution
    Order,
    /// Statement construction
    Build,
    /// Warehouse execution
    Execute,
    /// Output rendering
    Render,
}

impl Stage {
    /// Returns the stage tag used in responses and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Join => "join",
            Stage::Parse => "parse",
            Stage::Order => "order",
            Stage::Build => "build",
            Stage::Execute => "execute",
            Stage::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Filter text does not match the grammar or a literal cannot be typed
    MalformedFilter,
    /// Join list text is malformed or joins a table twice
    MalformedJoin,
    /// Ordering text is malformed
    MalformedOrder,
    /// Column not present in the tables in scope
    UnknownColumn,
    /// Table not present in the catalog
    UnknownTable,
    /// Unqualified column present in more than one joined table
    AmbiguousColumn,
    /// Join step whose left table is not yet in scope
    DisconnectedJoin,
    /// Warehouse failed to run the statement
    ExecutionFailure,
    /// Requested output format is not supported
    UnsupportedFormat,
}

impl QueryErrorKind {
    /// Returns the machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorKind::MalformedFilter => "MALFORMED_FILTER",
            QueryErrorKind::MalformedJoin => "MALFORMED_JOIN",
            QueryErrorKind::MalformedOrder => "MALFORMED_ORDER",
            QueryErrorKind::UnknownColumn => "UNKNOWN_COLUMN",
            QueryErrorKind::UnknownTable => "UNKNOWN_TABLE",
            QueryErrorKind::AmbiguousColumn => "AMBIGUOUS_COLUMN",
            QueryErrorKind::DisconnectedJoin => "DISCONNECTED_JOIN",
            QueryErrorKind::ExecutionFailure => "EXECUTION_FAILURE",
            QueryErrorKind::UnsupportedFormat => "UNSUPPORTED_FORMAT",
        }
    }
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A terminal request failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{stage}] {kind}: {reason}")]
pub struct QueryError {
    stage: Stage,
    kind: QueryErrorKind,
    reason: String,
}

impl QueryError {
    /// Create an error from its parts
    pub fn new(stage: Stage, kind: QueryErrorKind, reason: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            reason: reason.into(),
        }
    }

    /// Filter grammar or literal typing failure
    pub fn malformed_filter(reason: impl Into<String>) -> Self {
        Self::new(Stage::Parse, QueryErrorKind::MalformedFilter, reason)
    }

    /// Join list failure
    pub fn malformed_join(reason: impl Into<String>) -> Self {
        Self::new(Stage::Join, QueryErrorKind::MalformedJoin, reason)
    }

    /// Ordering failure
    pub fn malformed_order(reason: impl Into<String>) -> Self {
        Self::new(Stage::Order, QueryErrorKind::MalformedOrder, reason)
    }

    /// Unknown column at the given stage
    pub fn unknown_column(stage: Stage, column: &str) -> Self {
        Self::new(
            stage,
            QueryErrorKind::UnknownColumn,
            format!("unknown column '{}'", column),
        )
    }

    /// Unknown column within a named table
    pub fn unknown_column_in(stage: Stage, table: &str, column: &str) -> Self {
        Self::new(
            stage,
            QueryErrorKind::UnknownColumn,
            format!("table '{}' has no column '{}'", table, column),
        )
    }

    /// Unknown table at the given stage
    pub fn unknown_table(stage: Stage, table: &str) -> Self {
        Self::new(
            stage,
            QueryErrorKind::UnknownTable,
            format!("unknown table '{}'", table),
        )
    }

    /// Unqualified column found in several joined tables
    pub fn ambiguous_column(stage: Stage, column: &str, tables: &[&str]) -> Self {
        Self::new(
            stage,
            QueryErrorKind::AmbiguousColumn,
            format!(
                "column '{}' exists in tables {}; qualify it as table.column",
                column,
                tables.join(", ")
            ),
        )
    }

    /// Join step not reachable from the primary table
    pub fn disconnected_join(table: &str, primary: &str) -> Self {
        Self::new(
            Stage::Join,
            QueryErrorKind::DisconnectedJoin,
            format!(
                "table '{}' is not reachable from '{}' through the preceding join steps",
                table, primary
            ),
        )
    }

    /// Warehouse execution failure
    pub fn execution_failure(reason: impl Into<String>) -> Self {
        Self::new(Stage::Execute, QueryErrorKind::ExecutionFailure, reason)
    }

    /// Unsupported output format
    pub fn unsupported_format(format: &str) -> Self {
        Self::new(
            Stage::Validate,
            QueryErrorKind::UnsupportedFormat,
            format!("unsupported format '{}'", format),
        )
    }

    /// Stage at which the error occurred
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Error kind
    pub fn kind(&self) -> QueryErrorKind {
        self.kind
    }

    /// Caller-facing reason
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Result type for query engine operations
pub type QueryResult<T> = Result<T, QueryError>;
