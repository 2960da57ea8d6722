//! Immutable table catalog
//!
//! Loaded once at startup from warehouse introspection and shared read-only
//! between requests. Every caller-supplied table or column name is checked
//! here before it can reach a generated statement.

use std::collections::BTreeMap;

use super::types::{Column, TableSchema};

/// Table name → ordered columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from table schemas
    pub fn from_tables(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.name().to_string(), t))
                .collect(),
        }
    }

    /// Build a catalog from introspection rows `(table, column, data_type)`.
    ///
    /// Rows must arrive ordered by table and ordinal position; column order
    /// within a table follows row order.
    pub fn from_introspection<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let mut columns: BTreeMap<String, Vec<Column>> = BTreeMap::new();
        for (table, column, data_type) in rows {
            columns
                .entry(table.into())
                .or_default()
                .push(Column::new(column, data_type));
        }

        Self {
            tables: columns
                .into_iter()
                .map(|(name, cols)| (name.clone(), TableSchema::new(name, cols)))
                .collect(),
        }
    }

    /// Builder-style helper taking `(column, declared_type)` pairs
    pub fn with_table(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        let cols = columns
            .iter()
            .map(|(c, t)| Column::new(*c, *t))
            .collect();
        self.tables
            .insert(name.to_string(), TableSchema::new(name, cols));
        self
    }

    /// Look up a table
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Returns true if the table exists
    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in lexical order
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are known
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
