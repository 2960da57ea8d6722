//! # Comment Moderation
//!
//! Secondary workflow for user-submitted comments held in an object store
//! and approved into the warehouse by token-authorized moderators.

mod auth;
mod comment;
mod config;
mod errors;
mod local;
mod service;
mod store;

pub use auth::{Authorizer, JwtAuthorizer, ModerationTask, TokenClaims};
pub use comment::{Comment, UNKNOWN_REVIEWER};
pub use config::ModerationConfig;
pub use errors::{ModerationError, ModerationResult};
pub use local::LocalObjectStore;
pub use service::{
    validate_id, ModerationOutcome, ModerationService, APPROVED_PREFIX, DENIED_PREFIX,
    PENDING_PREFIX,
};
pub use store::ObjectStore;
