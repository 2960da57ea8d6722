//! # Query Engine
//!
//! Public entry point: validate, resolve joins, parse the filter, resolve
//! ordering, build, execute once, render. Every request ends in exactly one
//! rendered body or one [`QueryError`].

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::SchemaCatalog;
use crate::observability::{Logger, ObservationScope};
use crate::warehouse::{Warehouse, WarehouseResult};

use super::builder::{build, FieldSelection, QuerySpec, Statement};
use super::errors::{QueryError, QueryErrorKind, QueryResult, Stage};
use super::join::{resolve, JoinSpec};
use super::order::parse_order;
use super::predicate::parse;
use super::render::{render, render_count, OutputFormat, Rendered, ResultSet};
use super::scope::ColumnScope;

/// Raw request parameters as they arrive on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub fields: Option<String>,
    /// Filter expression
    pub query: Option<String>,
    pub join: Option<String>,
    pub order: Option<String>,
    pub format: Option<String>,
    pub count: Option<String>,
}

/// A request for one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub fields: FieldSelection,
    pub filter: Option<String>,
    pub joins: Vec<JoinSpec>,
    pub order: Option<String>,
    pub format: OutputFormat,
    pub count_only: bool,
}

impl QueryRequest {
    /// Request for every column of `table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Decode wire parameters.
    ///
    /// `count` enables count-only mode for any value other than `no`.
    pub fn from_params(table: impl Into<String>, params: &QueryParams) -> QueryResult<Self> {
        let count_only = params
            .count
            .as_deref()
            .map(str::trim)
            .is_some_and(|c| !c.is_empty() && !c.eq_ignore_ascii_case("no"));

        Ok(Self {
            table: table.into(),
            fields: FieldSelection::parse(params.fields.as_deref().unwrap_or("*")),
            filter: params.query.clone(),
            joins: JoinSpec::parse_list(params.join.as_deref().unwrap_or(""))?,
            order: params.order.clone(),
            format: OutputFormat::parse_opt(params.format.as_deref())?,
            count_only,
        })
    }
}

/// The query engine
#[derive(Debug, Clone)]
pub struct QueryEngine {
    catalog: Arc<SchemaCatalog>,
    warehouse: Arc<dyn Warehouse>,
}

impl QueryEngine {
    /// Create an engine over a loaded catalog
    pub fn new(catalog: Arc<SchemaCatalog>, warehouse: Arc<dyn Warehouse>) -> Self {
        Self { catalog, warehouse }
    }

    /// Introspect the warehouse and build an engine over it
    pub async fn load(warehouse: Arc<dyn Warehouse>) -> WarehouseResult<Self> {
        let catalog = warehouse.introspect_schema().await?;
        Ok(Self::new(Arc::new(catalog), warehouse))
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn warehouse(&self) -> &Arc<dyn Warehouse> {
        &self.warehouse
    }

    /// Resolve and build a request without executing it
    pub fn plan(&self, request: &QueryRequest) -> QueryResult<(QuerySpec, Statement)> {
        if !self.catalog.contains_table(&request.table) {
            return Err(QueryError::unknown_table(Stage::Validate, &request.table));
        }

        let joins = resolve(&request.joins, &request.table, &self.catalog)?;
        let scope = ColumnScope::for_plan(&self.catalog, &joins)?;

        let predicate = match request.filter.as_deref().map(str::trim) {
            Some(filter) if !filter.is_empty() => Some(parse(filter, &scope)?),
            _ => None,
        };

        let order = parse_order(request.order.as_deref().unwrap_or(""), &scope)?;

        let spec = QuerySpec {
            table: request.table.clone(),
            fields: request.fields.clone(),
            predicate,
            joins,
            order,
            format: request.format,
            count_only: request.count_only,
        };
        let statement = build(&self.catalog, &spec)?;
        Ok((spec, statement))
    }

    /// Run a request end to end
    pub async fn handle(&self, request: &QueryRequest) -> QueryResult<Rendered> {
        let scope = ObservationScope::with_fields(
            "QUERY",
            &[
                ("table", request.table.as_str()),
                ("format", request.format.as_str()),
            ],
        );

        match self.run(request).await {
            Ok((rendered, rows)) => {
                scope.complete_with_fields(&[("rows", &rows.to_string())]);
                Ok(rendered)
            }
            Err(err) => {
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    }

    async fn run(&self, request: &QueryRequest) -> QueryResult<(Rendered, usize)> {
        let (spec, statement) = self.plan(request)?;
        Logger::trace(
            "QUERY_STATEMENT",
            &[
                ("template", statement.template.as_str()),
                ("params", &statement.params.len().to_string()),
            ],
        );

        let mut result = self
            .warehouse
            .execute(&statement.template, &statement.params)
            .await?;
        if result.columns.is_empty() {
            result.columns = statement.columns.clone();
        }

        if spec.count_only {
            let count = extract_count(&result)?;
            return Ok((render_count(count, spec.format, &spec.table), 1));
        }

        let rows = result.len();
        Ok((render(&result, spec.format, &spec.table), rows))
    }

    /// Render the catalog's table names
    pub fn list_tables(&self, format: OutputFormat) -> Rendered {
        let rows = self
            .catalog
            .table_names()
            .map(|name| vec![Value::String(name.to_string())])
            .collect();
        render(
            &ResultSet::new(vec!["table_name".to_string()], rows),
            format,
            "tables",
        )
    }

    /// Render a table's columns. Text and CSV list names only; the other
    /// formats add each column's declared type.
    pub fn describe_table(&self, table: &str, format: OutputFormat) -> QueryResult<Rendered> {
        let schema = self
            .catalog
            .table(table)
            .ok_or_else(|| QueryError::unknown_table(Stage::Validate, table))?;

        let with_types = !matches!(format, OutputFormat::Text | OutputFormat::Csv);
        let rows = schema
            .columns()
            .iter()
            .map(|c| {
                let mut row = vec![Value::String(c.name.clone())];
                if with_types {
                    row.push(Value::String(c.declared_type.clone()));
                }
                row
            })
            .collect();
        let columns = if with_types {
            vec!["name".to_string(), "type".to_string()]
        } else {
            vec!["name".to_string()]
        };
        Ok(render(&ResultSet::new(columns, rows), format, table))
    }
}

fn extract_count(result: &ResultSet) -> QueryResult<i64> {
    let cell = result
        .rows
        .first()
        .and_then(|row| row.first())
        .ok_or_else(|| QueryError::execution_failure("count query returned no rows"))?;

    match cell {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        QueryError::new(
            Stage::Render,
            QueryErrorKind::ExecutionFailure,
            "count query returned a non-integer value",
        )
    })
}
