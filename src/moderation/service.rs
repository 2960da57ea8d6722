//! # Moderation Service
//!
//! Comments wait under `underreview/` until a moderator approves or denies
//! them. Approval inserts the comment into the warehouse and then moves the
//! object to `approved/`; denial moves it to `notapproved/`. The object is
//! only moved once the insert has succeeded.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::observability::{Logger, ObservationScope};
use crate::query::{build_insert, QueryEngine};

use super::auth::{Authorizer, ModerationTask};
use super::comment::Comment;
use super::errors::{ModerationError, ModerationResult};
use super::store::ObjectStore;

/// Prefix of comments awaiting review
pub const PENDING_PREFIX: &str = "underreview/";
/// Prefix of approved comments
pub const APPROVED_PREFIX: &str = "approved/";
/// Prefix of denied comments
pub const DENIED_PREFIX: &str = "notapproved/";

/// Check a comment id: `[A-Za-z0-9._-]+`, not starting with `.`
pub fn validate_id(id: &str) -> ModerationResult<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ModerationError::InvalidId(id.to_string()))
    }
}

/// Result of a moderation action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModerationOutcome {
    pub id: String,
    pub status: &'static str,
    /// Object key after the move
    pub location: String,
}

/// Comment moderation workflow
#[derive(Debug, Clone)]
pub struct ModerationService {
    store: Arc<dyn ObjectStore>,
    authorizer: Arc<dyn Authorizer>,
    engine: QueryEngine,
    comments_table: String,
}

impl ModerationService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        authorizer: Arc<dyn Authorizer>,
        engine: QueryEngine,
        comments_table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            authorizer,
            engine,
            comments_table: comments_table.into(),
        }
    }

    /// Store a new comment for review and return its id
    pub fn submit(&self, data: &[u8]) -> ModerationResult<String> {
        let comment = Comment::from_json(data)?;
        let id = format!("{}.json", Uuid::new_v4());
        self.store.write(&format!("{}{}", PENDING_PREFIX, id), data)?;

        Logger::info(
            "COMMENT_SUBMITTED",
            &[("id", &id), ("dashboard", &comment.dashboard)],
        );
        Ok(id)
    }

    /// Ids of comments awaiting review
    pub fn list_pending(&self, token: &str) -> ModerationResult<Vec<String>> {
        self.authorizer.authorize(token, ModerationTask::Review)?;
        Ok(self
            .store
            .list(PENDING_PREFIX)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(PENDING_PREFIX).map(str::to_string))
            .collect())
    }

    /// Fetch a pending comment
    pub fn pending(&self, id: &str, token: &str) -> ModerationResult<Comment> {
        self.authorizer.authorize(token, ModerationTask::Review)?;
        validate_id(id)?;
        let data = self.store.read(&format!("{}{}", PENDING_PREFIX, id))?;
        Comment::from_json(&data)
    }

    /// Approve a pending comment
    pub async fn approve(
        &self,
        id: &str,
        token: &str,
        reviewer: Option<&str>,
    ) -> ModerationResult<ModerationOutcome> {
        let scope = ObservationScope::with_fields("MODERATION_APPROVE", &[("id", id)]);
        match self.run_approve(id, token, reviewer).await {
            Ok(outcome) => {
                scope.complete();
                Ok(outcome)
            }
            Err(err) => {
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    }

    async fn run_approve(
        &self,
        id: &str,
        token: &str,
        reviewer: Option<&str>,
    ) -> ModerationResult<ModerationOutcome> {
        self.authorizer.authorize(token, ModerationTask::Approve)?;
        validate_id(id)?;

        let source = format!("{}{}", PENDING_PREFIX, id);
        let comment = Comment::from_json(&self.store.read(&source)?)?;

        let row = comment.to_row(Utc::now(), reviewer);
        let statement = build_insert(self.engine.catalog(), &self.comments_table, &row)?;
        self.engine
            .warehouse()
            .execute(&statement.template, &statement.params)
            .await?;

        let destination = format!("{}{}", APPROVED_PREFIX, id);
        self.store.move_object(&source, &destination)?;

        Ok(ModerationOutcome {
            id: id.to_string(),
            status: "approved",
            location: destination,
        })
    }

    /// Deny a pending comment
    pub fn deny(&self, id: &str, token: &str) -> ModerationResult<ModerationOutcome> {
        let scope = ObservationScope::with_fields("MODERATION_DENY", &[("id", id)]);
        let result = self.run_deny(id, token);
        match &result {
            Ok(_) => scope.complete(),
            Err(err) => scope.fail(&err.to_string()),
        }
        result
    }

    fn run_deny(&self, id: &str, token: &str) -> ModerationResult<ModerationOutcome> {
        self.authorizer.authorize(token, ModerationTask::Deny)?;
        validate_id(id)?;

        let source = format!("{}{}", PENDING_PREFIX, id);
        let destination = format!("{}{}", DENIED_PREFIX, id);
        self.store.move_object(&source, &destination)?;

        Ok(ModerationOutcome {
            id: id.to_string(),
            status: "denied",
            location: destination,
        })
    }
}
