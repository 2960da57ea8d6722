//! Column scope
//!
//! The set of tables a request may reference: the primary table followed by
//! every table introduced by the join plan, in plan order. Filter columns,
//! projected fields and ordering keys all resolve through here.

use crate::catalog::{ColumnType, SchemaCatalog, TableSchema};

use super::errors::{QueryError, QueryErrorKind, QueryResult, Stage};
use super::join::JoinPlan;

/// A column resolved against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Owning table
    pub table: String,
    /// Column name
    pub column: String,
    /// Classified type
    pub column_type: ColumnType,
}

impl ColumnRef {
    /// `table.column`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }

    /// SQL reference, qualified when the statement spans several tables
    pub fn to_sql(&self, qualify: bool) -> String {
        if qualify {
            format!("{}.{}", quote_ident(&self.table), quote_ident(&self.column))
        } else {
            quote_ident(&self.column)
        }
    }
}

/// Double-quote an identifier. Identifiers are catalog-validated before they
/// get here; doubling embedded quotes keeps the output well-formed regardless.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Tables a request may reference
#[derive(Debug, Clone)]
pub struct ColumnScope<'a> {
    tables: Vec<&'a TableSchema>,
}

impl<'a> ColumnScope<'a> {
    /// Scope of a single table
    pub fn for_table(catalog: &'a SchemaCatalog, table: &str) -> QueryResult<Self> {
        let schema = catalog
            .table(table)
            .ok_or_else(|| QueryError::unknown_table(Stage::Validate, table))?;
        Ok(Self {
            tables: vec![schema],
        })
    }

    /// Scope of a resolved join plan
    pub fn for_plan(catalog: &'a SchemaCatalog, plan: &JoinPlan) -> QueryResult<Self> {
        plan.tables()
            .map(|name| {
                catalog
                    .table(name)
                    .ok_or_else(|| QueryError::unknown_table(Stage::Join, name))
            })
            .collect::<QueryResult<Vec<_>>>()
            .map(|tables| Self { tables })
    }

    /// Tables in scope order; the first is the primary table
    pub fn tables(&self) -> &[&'a TableSchema] {
        &self.tables
    }

    /// Returns true if more than one table is in scope
    pub fn is_joined(&self) -> bool {
        self.tables.len() > 1
    }

    /// Resolve `column` or `table.column`.
    ///
    /// Unqualified names resolve to the primary table first, then to the one
    /// joined table that has the column.
    pub fn resolve(&self, name: &str, stage: Stage) -> QueryResult<ColumnRef> {
        if let Some((table, column)) = name.split_once('.') {
            let schema = self
                .tables
                .iter()
                .find(|t| t.name() == table)
                .ok_or_else(|| {
                    QueryError::new(
                        stage,
                        QueryErrorKind::UnknownColumn,
                        format!("table '{}' is not part of this query", table),
                    )
                })?;
            return Self::column_ref(schema, column)
                .ok_or_else(|| QueryError::unknown_column_in(stage, table, column));
        }

        let (primary, joined) = match self.tables.split_first() {
            Some(split) => split,
            None => return Err(QueryError::unknown_column(stage, name)),
        };

        if let Some(found) = Self::column_ref(primary, name) {
            return Ok(found);
        }

        let matches: Vec<&&TableSchema> = joined.iter().filter(|t| t.has_column(name)).collect();
        match matches.as_slice() {
            [] => Err(QueryError::unknown_column(stage, name)),
            [only] => Self::column_ref(only, name)
                .ok_or_else(|| QueryError::unknown_column(stage, name)),
            many => {
                let names: Vec<&str> = many.iter().map(|t| t.name()).collect();
                Err(QueryError::ambiguous_column(stage, name, &names))
            }
        }
    }

    fn column_ref(table: &TableSchema, column: &str) -> Option<ColumnRef> {
        table.column(column).map(|c| ColumnRef {
            table: table.name().to_string(),
            column: c.name.clone(),
            column_type: c.column_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::join::{resolve, JoinSpec};

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new()
            .with_table(
                "biomass_oie",
                &[("member_country", "text"), ("year", "integer"), ("biomass", "numeric")],
            )
            .with_table(
                "countries_geo_area",
                &[("country", "text"), ("area", "numeric"), ("region", "text")],
            )
            .with_table("regions", &[("region", "text"), ("area", "numeric")])
    }

    #[test]
    fn test_resolve_single_table() {
        let catalog = catalog();
        let scope = ColumnScope::for_table(&catalog, "biomass_oie").unwrap();
        let col = scope.resolve("year", Stage::Parse).unwrap();
        assert_eq!(col.table, "biomass_oie");
        assert_eq!(col.column_type, ColumnType::Integer);
        assert!(!scope.is_joined());
    }

    #[test]
    fn test_unknown_table_scope() {
        let catalog = catalog();
        let err = ColumnScope::for_table(&catalog, "nope").unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownTable);
    }

    #[test]
    fn test_resolve_qualified_and_joined() {
        let catalog = catalog();
        let plan = resolve(
            &[
                JoinSpec::new("biomass_oie", "member_country", "countries_geo_area", "country"),
                JoinSpec::new("countries_geo_area", "region", "regions", "region"),
            ],
            "biomass_oie",
            &catalog,
        )
        .unwrap();
        let scope = ColumnScope::for_plan(&catalog, &plan).unwrap();

        assert_eq!(
            scope.resolve("regions.area", Stage::Parse).unwrap().table,
            "regions"
        );
        assert_eq!(scope.resolve("country", Stage::Parse).unwrap().table, "countries_geo_area");

        // `area` lives in two joined tables and not in the primary
        let err = scope.resolve("area", Stage::Parse).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::AmbiguousColumn);
    }

    #[test]
    fn test_qualified_table_out_of_scope() {
        let catalog = catalog();
        let scope = ColumnScope::for_table(&catalog, "biomass_oie").unwrap();
        let err = scope.resolve("regions.region", Stage::Parse).unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::UnknownColumn);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("year"), "\"year\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
