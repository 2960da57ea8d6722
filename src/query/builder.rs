//! Statement construction
//!
//! Turns a [`QuerySpec`] into a SQL template with `$n` placeholders and the
//! values bound to them. Literals never appear in the template text; every
//! identifier has been resolved against the catalog and is double-quoted.

use crate::catalog::{ColumnType, SchemaCatalog};

use super::errors::{QueryError, QueryResult, Stage};
use super::join::JoinPlan;
use super::order::OrderKey;
use super::predicate::{Literal, PredicateNode};
use super::render::OutputFormat;
use super::scope::{quote_ident, ColumnRef, ColumnScope};

/// A value bound to a statement placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Null,
}

impl From<&Literal> for SqlValue {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::Integer(i) => SqlValue::Integer(*i),
            Literal::Float(f) => SqlValue::Float(*f),
            Literal::Boolean(b) => SqlValue::Boolean(*b),
            Literal::Text(s) => SqlValue::Text(s.clone()),
        }
    }
}

impl SqlValue {
    /// Placeholder cast fixing the bound value's wire type
    fn wire_cast(&self) -> &'static str {
        match self {
            SqlValue::Integer(_) => "bigint",
            SqlValue::Float(_) => "double precision",
            SqlValue::Boolean(_) => "boolean",
            SqlValue::Text(_) | SqlValue::Null => "text",
        }
    }
}

/// Requested projection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    /// Every column in scope
    #[default]
    All,
    /// Caller-ordered distinct column names
    Columns(Vec<String>),
}

impl FieldSelection {
    /// Parse the wire form: `*` or blank for all columns, otherwise a
    /// comma-separated list. Repeated names collapse to the first occurrence.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return FieldSelection::All;
        }

        let mut fields: Vec<String> = Vec::new();
        for field in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }

        if fields.is_empty() {
            FieldSelection::All
        } else {
            FieldSelection::Columns(fields)
        }
    }
}

/// A fully resolved request
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub table: String,
    pub fields: FieldSelection,
    pub predicate: Option<PredicateNode>,
    pub joins: JoinPlan,
    pub order: Vec<OrderKey>,
    pub format: OutputFormat,
    pub count_only: bool,
}

/// Parameterized statement ready for the warehouse
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `$n` placeholders
    pub template: String,
    /// Values for `$1..$n` in order
    pub params: Vec<SqlValue>,
    /// Output column names in projection order
    pub columns: Vec<String>,
}

/// Build a SELECT statement
pub fn build(catalog: &SchemaCatalog, spec: &QuerySpec) -> QueryResult<Statement> {
    let scope = ColumnScope::for_plan(catalog, &spec.joins)?;
    let qualify = scope.is_joined();

    let (projection, columns) = if spec.count_only {
        ("COUNT(*) AS \"count\"".to_string(), vec!["count".to_string()])
    } else {
        project(&scope, &spec.fields)?
    };

    let mut sql = format!("SELECT {} FROM {}", projection, quote_ident(&spec.table));

    for step in spec.joins.steps() {
        sql.push_str(&format!(
            " INNER JOIN {} ON {}.{} = {}.{}",
            quote_ident(&step.right_table),
            quote_ident(&step.left_table),
            quote_ident(&step.left_key),
            quote_ident(&step.right_table),
            quote_ident(&step.right_key),
        ));
    }

    let mut params = Vec::new();
    if let Some(predicate) = &spec.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&emit_predicate(predicate, qualify, &mut params));
    }

    if !spec.count_only && !spec.order.is_empty() {
        let keys: Vec<String> = spec
            .order
            .iter()
            .map(|k| format!("{} {}", k.column.to_sql(qualify), k.direction.as_sql()))
            .collect();
        sql.push_str(" ORDER BY ");
        sql.push_str(&keys.join(", "));
    }

    Ok(Statement {
        template: sql,
        params,
        columns,
    })
}

fn project(
    scope: &ColumnScope<'_>,
    fields: &FieldSelection,
) -> QueryResult<(String, Vec<String>)> {
    let qualify = scope.is_joined();
    let mut items = Vec::new();
    let mut columns = Vec::new();

    match fields {
        FieldSelection::All => {
            let tables = if qualify {
                scope.tables()
            } else {
                &scope.tables()[..1]
            };
            for table in tables {
                for column in table.columns() {
                    if qualify {
                        let alias = format!("{}.{}", table.name(), column.name);
                        items.push(format!(
                            "{}.{} AS {}",
                            quote_ident(table.name()),
                            quote_ident(&column.name),
                            quote_ident(&alias)
                        ));
                        columns.push(alias);
                    } else {
                        items.push(quote_ident(&column.name));
                        columns.push(column.name.clone());
                    }
                }
            }
        }
        FieldSelection::Columns(names) => {
            for name in names {
                // Output columns carry the caller's spelling
                let column = scope.resolve(name, Stage::Build)?;
                if qualify || column.column != *name {
                    items.push(format!(
                        "{} AS {}",
                        column.to_sql(qualify),
                        quote_ident(name)
                    ));
                } else {
                    items.push(column.to_sql(false));
                }
                columns.push(name.clone());
            }
        }
    }

    Ok((items.join(", "), columns))
}

fn emit_predicate(node: &PredicateNode, qualify: bool, params: &mut Vec<SqlValue>) -> String {
    match node {
        PredicateNode::Comparison {
            column,
            op,
            literal,
        } => {
            let value = SqlValue::from(literal);
            let (lhs, rhs) = comparison_sides(column, &value, params.len() + 1, qualify);
            params.push(value);
            format!("{} {} {}", lhs, op.symbol(), rhs)
        }
        PredicateNode::And(l, r) => format!(
            "({} AND {})",
            emit_predicate(l, qualify, params),
            emit_predicate(r, qualify, params)
        ),
        PredicateNode::Or(l, r) => format!(
            "({} OR {})",
            emit_predicate(l, qualify, params),
            emit_predicate(r, qualify, params)
        ),
    }
}

fn comparison_sides(
    column: &ColumnRef,
    value: &SqlValue,
    index: usize,
    qualify: bool,
) -> (String, String) {
    let lhs = column.to_sql(qualify);
    let placeholder = format!("${}::{}", index, value.wire_cast());

    match (value, column.column_type) {
        (SqlValue::Text(_), ColumnType::Date) => (lhs, format!("{}::date", placeholder)),
        (SqlValue::Text(_), ColumnType::Timestamp) => (lhs, format!("{}::timestamp", placeholder)),
        (SqlValue::Text(_), ColumnType::Other) => (format!("{}::text", lhs), placeholder),
        _ => (lhs, placeholder),
    }
}

/// Build an `INSERT ... RETURNING *` for one row.
///
/// Text and null values are bound as text and cast to the column's type.
pub fn build_insert(
    catalog: &SchemaCatalog,
    table: &str,
    values: &[(&str, SqlValue)],
) -> QueryResult<Statement> {
    let schema = catalog
        .table(table)
        .ok_or_else(|| QueryError::unknown_table(Stage::Build, table))?;

    let mut names = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());

    for (i, (name, value)) in values.iter().enumerate() {
        let column = schema
            .column(name)
            .ok_or_else(|| QueryError::unknown_column_in(Stage::Build, table, name))?;

        let mut placeholder = format!("${}::{}", i + 1, value.wire_cast());
        if matches!(value, SqlValue::Text(_) | SqlValue::Null) {
            if let Some(target) = column.column_type.text_cast_target() {
                placeholder.push_str("::");
                placeholder.push_str(target);
            }
        }

        names.push(quote_ident(&column.name));
        placeholders.push(placeholder);
        params.push(value.clone());
    }

    let template = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        quote_ident(schema.name()),
        names.join(", "),
        placeholders.join(", ")
    );

    Ok(Statement {
        template,
        params,
        columns: schema.column_names().map(str::to_string).collect(),
    })
}
