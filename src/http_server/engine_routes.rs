//! Public Query HTTP Routes
//!
//! Catalog listing, table description, ad-hoc table queries and the
//! livestock population shortcut. Bodies are rendered by the engine in the
//! requested format.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::query::{
    population_request, OutputFormat, PopulationFilter, QueryEngine, QueryParams, QueryRequest,
    Rendered,
};

use super::errors::{ApiError, ApiResult};

// ==================
// Shared State
// ==================

/// Engine state shared across handlers
pub struct EngineState {
    pub engine: QueryEngine,
}

impl EngineState {
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }
}

// ==================
// Request Types
// ==================

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DescribeQuery {
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PopulationQuery {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub iso3: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
}

// ==================
// Engine Routes
// ==================

/// Create public query routes
pub fn engine_routes(state: Arc<EngineState>) -> Router {
    Router::new()
        .route("/GBADsTables/public", get(list_tables_handler))
        .route("/GBADsTable/public", get(describe_table_handler))
        .route("/GBADsPublicQuery/:table_name", get(public_query_handler))
        .route(
            "/GBADsLivestockPopulation/:data_source",
            get(livestock_population_handler),
        )
        .with_state(state)
}

/// Turn a rendered body into a response with its content type
pub fn rendered_response(rendered: Rendered) -> Response {
    let mut response = rendered.body.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(rendered.content_type),
    );
    if let Some(filename) = rendered.filename {
        let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    response
}

// ==================
// Handlers
// ==================

async fn list_tables_handler(
    State(state): State<Arc<EngineState>>,
    Query(query): Query<FormatQuery>,
) -> ApiResult<Response> {
    let format = OutputFormat::parse_opt(query.format.as_deref())?;
    Ok(rendered_response(state.engine.list_tables(format)))
}

async fn describe_table_handler(
    State(state): State<Arc<EngineState>>,
    Query(query): Query<DescribeQuery>,
) -> ApiResult<Response> {
    let table = query
        .table_name
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::MissingParam("table_name".to_string()))?;
    let format = OutputFormat::parse_opt(query.format.as_deref())?;
    Ok(rendered_response(state.engine.describe_table(&table, format)?))
}

async fn public_query_handler(
    State(state): State<Arc<EngineState>>,
    Path(table_name): Path<String>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Response> {
    let request = QueryRequest::from_params(table_name, &params)?;
    let rendered = state.engine.handle(&request).await?;
    Ok(rendered_response(rendered))
}

async fn livestock_population_handler(
    State(state): State<Arc<EngineState>>,
    Path(data_source): Path<String>,
    Query(query): Query<PopulationQuery>,
) -> ApiResult<Response> {
    let format = OutputFormat::parse_opt(query.format.as_deref())?;
    let filter = PopulationFilter {
        year: query.year,
        iso3: query.iso3,
        country: query.country,
        species: query.species,
    };
    let request = population_request(&data_source, &filter, format)?;
    let rendered = state.engine.handle(&request).await?;
    Ok(rendered_response(rendered))
}
