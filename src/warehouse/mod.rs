//! # Warehouse
//!
//! Storage collaborator for the query engine: schema introspection and
//! execution of parameterized statements.

mod backend;
mod errors;
mod memory;
mod postgres;

pub use backend::Warehouse;
pub use errors::{WarehouseError, WarehouseResult};
pub use memory::{ExecutedStatement, InMemoryWarehouse};
pub use postgres::{PgConfig, PgWarehouse};
