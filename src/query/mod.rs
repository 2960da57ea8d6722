//! # Query Engine
//!
//! Translates loosely structured request parameters (table, fields, filter,
//! joins, ordering, format, count flag) into one parameterized statement and
//! renders the rows it returns.

mod builder;
mod engine;
mod errors;
mod join;
mod lexer;
mod order;
mod population;
mod predicate;
mod render;
mod scope;

pub use builder::{build, build_insert, FieldSelection, QuerySpec, SqlValue, Statement};
pub use engine::{QueryEngine, QueryParams, QueryRequest};
pub use errors::{QueryError, QueryErrorKind, QueryResult, Stage};
pub use join::{resolve, JoinPlan, JoinSpec, JoinStep};
pub use lexer::{Lexer, Spanned, Token};
pub use order::{parse_order, Direction, OrderKey};
pub use population::{population_request, PopulationFilter, PopulationSource};
pub use predicate::{parse, ComparisonOp, Literal, PredicateNode, MAX_GROUP_DEPTH};
pub use render::{escape_html, render, render_count, OutputFormat, Rendered, ResultSet};
pub use scope::{quote_ident, ColumnRef, ColumnScope};
