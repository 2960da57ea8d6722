//! # Moderation Token Verification
//!
//! Moderation actions are authorized by a JWT whose `app` claim names the
//! moderation bot and whose `task` claim names the action. Tokens are either
//! RS256-signed with a per-task key pair or HS256-signed with a shared secret.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::errors::{ModerationError, ModerationResult};

/// Moderation action a token may authorize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationTask {
    Approve,
    Deny,
    Review,
}

impl ModerationTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationTask::Approve => "approve",
            ModerationTask::Deny => "deny",
            ModerationTask::Review => "review",
        }
    }
}

impl fmt::Display for ModerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationTask {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(ModerationTask::Approve),
            "deny" => Ok(ModerationTask::Deny),
            "review" => Ok(ModerationTask::Review),
            other => Err(ModerationError::Config(format!("unknown task '{}'", other))),
        }
    }
}

/// Claims carried by a moderation token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Application the token was issued for
    pub app: String,

    /// Authorized action
    pub task: String,

    /// Optional subject (reviewer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Optional expiration (Unix epoch seconds); checked when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Verifies moderation tokens
pub trait Authorizer: Send + Sync + fmt::Debug {
    /// Verify `token` and check that it authorizes `task`
    fn authorize(&self, token: &str, task: ModerationTask) -> ModerationResult<TokenClaims>;
}

/// JWT-based authorizer
#[derive(Clone)]
pub struct JwtAuthorizer {
    app: String,
    algorithm: Algorithm,
    shared: Option<DecodingKey>,
    per_task: HashMap<ModerationTask, DecodingKey>,
}

impl fmt::Debug for JwtAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthorizer")
            .field("app", &self.app)
            .field("algorithm", &self.algorithm)
            .field("tasks", &self.per_task.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl JwtAuthorizer {
    /// Authorizer verifying HS256 tokens signed with a shared secret
    pub fn hs256(app: impl Into<String>, secret: &[u8]) -> Self {
        Self {
            app: app.into(),
            algorithm: Algorithm::HS256,
            shared: Some(DecodingKey::from_secret(secret)),
            per_task: HashMap::new(),
        }
    }

    /// Authorizer verifying RS256 tokens against one public key per task
    pub fn rs256(
        app: impl Into<String>,
        keys: &[(ModerationTask, Vec<u8>)],
    ) -> ModerationResult<Self> {
        let mut per_task = HashMap::new();
        for (task, pem) in keys {
            let key = DecodingKey::from_rsa_pem(pem).map_err(|e| {
                ModerationError::Config(format!("bad public key for task {}: {}", task, e))
            })?;
            per_task.insert(*task, key);
        }

        Ok(Self {
            app: app.into(),
            algorithm: Algorithm::RS256,
            shared: None,
            per_task,
        })
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    fn key_for(&self, task: ModerationTask) -> ModerationResult<&DecodingKey> {
        self.per_task
            .get(&task)
            .or(self.shared.as_ref())
            .ok_or_else(|| {
                ModerationError::Unauthorized(format!("no verification key for task {}", task))
            })
    }
}

impl Authorizer for JwtAuthorizer {
    fn authorize(&self, token: &str, task: ModerationTask) -> ModerationResult<TokenClaims> {
        if token.trim().is_empty() {
            return Err(ModerationError::Unauthorized("missing token".to_string()));
        }

        let key = self.key_for(task)?;

        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        let data = decode::<TokenClaims>(token, key, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid signature",
                ErrorKind::InvalidAlgorithm => "unexpected signing algorithm",
                _ => "malformed token",
            };
            ModerationError::Unauthorized(reason.to_string())
        })?;

        let claims = data.claims;
        if claims.app != self.app {
            return Err(ModerationError::Forbidden(format!(
                "token issued for app '{}'",
                claims.app
            )));
        }
        if claims.task != task.as_str() {
            return Err(ModerationError::Forbidden(format!(
                "token authorizes task '{}', not '{}'",
                claims.task, task
            )));
        }

        Ok(claims)
    }
}
