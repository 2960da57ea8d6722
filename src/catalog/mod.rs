//! Schema catalog
//!
//! Process-wide, read-only knowledge of the warehouse's public tables.
//! Constructed explicitly and passed by reference (or `Arc`) to every
//! component that validates identifiers.

mod schema_catalog;
mod types;

pub use schema_catalog::SchemaCatalog;
pub use types::{Column, ColumnType, TableSchema};
