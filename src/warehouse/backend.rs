//! # Warehouse Trait

use async_trait::async_trait;

use crate::catalog::SchemaCatalog;
use crate::query::{ResultSet, SqlValue};

use super::errors::WarehouseResult;

/// Relational storage the engine reads from
#[async_trait]
pub trait Warehouse: Send + Sync + std::fmt::Debug {
    /// Load the table catalog
    async fn introspect_schema(&self) -> WarehouseResult<SchemaCatalog>;

    /// Run a parameterized statement once.
    ///
    /// `params[i]` binds to placeholder `$i+1`. Rows come back in the
    /// statement's projection order.
    async fn execute(&self, template: &str, params: &[SqlValue]) -> WarehouseResult<ResultSet>;
}
