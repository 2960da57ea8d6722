//! Column type classification
//!
//! PostgreSQL reports a column's type as the `information_schema.columns.data_type`
//! string. The engine only needs to know how a literal compared against the column
//! must be typed and bound, so declared types collapse into a handful of classes.

use serde::{Deserialize, Serialize};

/// Classified column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// smallint, integer, bigint
    Integer,
    /// real, double precision, numeric, decimal
    Float,
    /// boolean
    Boolean,
    /// date
    Date,
    /// timestamp with or without time zone
    Timestamp,
    /// character varying, character, text, name
    Text,
    /// Anything else (json, uuid, arrays, ...). Compared as text.
    Other,
}

impl ColumnType {
    /// Classify a declared `data_type` string
    pub fn from_declared(data_type: &str) -> Self {
        let declared = data_type.trim().to_ascii_lowercase();
        match declared.as_str() {
            "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" => {
                ColumnType::Integer
            }
            "real" | "double precision" | "numeric" | "decimal" | "float4" | "float8" => {
                ColumnType::Float
            }
            "boolean" | "bool" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "text" | "name" | "citext" => ColumnType::Text,
            d if d.starts_with("timestamp") => ColumnType::Timestamp,
            d if d.starts_with("character") || d.starts_with("varchar") || d.starts_with("char") => {
                ColumnType::Text
            }
            d if d.starts_with("numeric") || d.starts_with("decimal") => ColumnType::Float,
            _ => ColumnType::Other,
        }
    }

    /// Returns true for integer and float columns
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// SQL type a text-bound value is cast to before comparison or insertion.
    ///
    /// `None` means the value stays text.
    pub fn text_cast_target(&self) -> Option<&'static str> {
        match self {
            ColumnType::Integer => Some("bigint"),
            ColumnType::Float => Some("double precision"),
            ColumnType::Boolean => Some("boolean"),
            ColumnType::Date => Some("date"),
            ColumnType::Timestamp => Some("timestamp"),
            ColumnType::Text | ColumnType::Other => None,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Text => "text",
            ColumnType::Other => "other",
        }
    }
}

/// A column as recorded in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name exactly as the warehouse reports it
    pub name: String,
    /// Declared type string, kept for describe output
    pub declared_type: String,
    /// Classified type
    pub column_type: ColumnType,
}

impl Column {
    /// Create a column from its declared type
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            column_type: ColumnType::from_declared(&declared_type),
            declared_type,
        }
    }
}

/// A table and its columns in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    name: String,
    columns: Vec<Column>,
}

impl TableSchema {
    /// Create a table schema
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    ///
    /// An exact match wins; otherwise the lowercased name is tried, the way
    /// PostgreSQL folds unquoted identifiers.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name).or_else(|| {
            let folded = name.to_ascii_lowercase();
            self.columns.iter().find(|c| c.name == folded)
        })
    }

    /// Returns true if the table has the column
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_declared_types() {
        assert_eq!(ColumnType::from_declared("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_declared("bigint"), ColumnType::Integer);
        assert_eq!(ColumnType::from_declared("double precision"), ColumnType::Float);
        assert_eq!(ColumnType::from_declared("numeric"), ColumnType::Float);
        assert_eq!(ColumnType::from_declared("character varying"), ColumnType::Text);
        assert_eq!(ColumnType::from_declared("text"), ColumnType::Text);
        assert_eq!(ColumnType::from_declared("boolean"), ColumnType::Boolean);
        assert_eq!(ColumnType::from_declared("date"), ColumnType::Date);
        assert_eq!(
            ColumnType::from_declared("timestamp without time zone"),
            ColumnType::Timestamp
        );
        assert_eq!(ColumnType::from_declared("jsonb"), ColumnType::Other);
    }

    #[test]
    fn test_numeric_classes() {
        assert!(ColumnType::Integer.is_numeric());
        assert!(ColumnType::Float.is_numeric());
        assert!(!ColumnType::Text.is_numeric());
        assert!(!ColumnType::Date.is_numeric());
    }

    #[test]
    fn test_table_column_lookup() {
        let table = TableSchema::new(
            "biomass_oie",
            vec![
                Column::new("member_country", "character varying"),
                Column::new("year", "integer"),
            ],
        );

        assert!(table.has_column("year"));
        assert!(!table.has_column("yr"));
        assert_eq!(table.column("year").unwrap().column_type, ColumnType::Integer);
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["member_country", "year"]
        );
    }

    #[test]
    fn test_column_lookup_folds_case() {
        let table = TableSchema::new(
            "gbads_comments",
            vec![Column::new("ispublic", "boolean"), Column::new("isPublic", "text")],
        );

        assert_eq!(table.column("Year"), None);
        assert_eq!(table.column("isPublic").unwrap().declared_type, "text");
        assert_eq!(table.column("ISPUBLIC").unwrap().declared_type, "boolean");
        assert_eq!(table.column("IsPublic").unwrap().name, "ispublic");
    }
}
