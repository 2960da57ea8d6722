//! Comment Moderation HTTP Routes
//!
//! Tokens are read from the `authorization_token` query parameter or an
//! `Authorization: Bearer` header.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::moderation::{Comment, ModerationOutcome, ModerationService};

use super::errors::ApiResult;

// ==================
// Shared State
// ==================

/// Moderation state shared across handlers
pub struct ModerationState {
    pub service: ModerationService,
}

impl ModerationState {
    pub fn new(service: ModerationService) -> Self {
        Self { service }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub reviewer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmittedResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct PendingListResponse {
    pub comments: Vec<String>,
    pub total: usize,
}

// ==================
// Moderation Routes
// ==================

/// Create moderation routes
pub fn moderation_routes(state: Arc<ModerationState>) -> Router {
    Router::new()
        .route("/comments", post(submit_handler).get(list_pending_handler))
        .route("/comments/:id", get(pending_handler))
        .route("/approve/:id", post(approve_handler))
        .route("/deny/:id", post(deny_handler))
        .with_state(state)
}

/// Token from the query string, falling back to a bearer header
fn extract_token(query: &TokenQuery, headers: &HeaderMap) -> String {
    if let Some(token) = query.authorization_token.as_deref().filter(|t| !t.is_empty()) {
        return token.to_string();
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

// ==================
// Handlers
// ==================

async fn submit_handler(
    State(state): State<Arc<ModerationState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SubmittedResponse>)> {
    let id = state.service.submit(&body)?;
    Ok((StatusCode::CREATED, Json(SubmittedResponse { id })))
}

async fn list_pending_handler(
    State(state): State<Arc<ModerationState>>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<PendingListResponse>> {
    let comments = state.service.list_pending(&extract_token(&query, &headers))?;
    Ok(Json(PendingListResponse {
        total: comments.len(),
        comments,
    }))
}

async fn pending_handler(
    State(state): State<Arc<ModerationState>>,
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<Comment>> {
    let comment = state
        .service
        .pending(&id, &extract_token(&query, &headers))?;
    Ok(Json(comment))
}

async fn approve_handler(
    State(state): State<Arc<ModerationState>>,
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<ModerationOutcome>> {
    let token = extract_token(&query, &headers);
    let outcome = state
        .service
        .approve(&id, &token, query.reviewer.as_deref())
        .await?;
    Ok(Json(outcome))
}

async fn deny_handler(
    State(state): State<Arc<ModerationState>>,
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<ModerationOutcome>> {
    let outcome = state.service.deny(&id, &extract_token(&query, &headers))?;
    Ok(Json(outcome))
}
