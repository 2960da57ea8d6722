//! # Moderation Configuration

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::auth::{Authorizer, JwtAuthorizer, ModerationTask};
use super::errors::{ModerationError, ModerationResult};

/// Moderation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Mount the moderation routes
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Root directory of the local object store
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,

    /// Expected `app` claim
    #[serde(default = "default_app")]
    pub app: String,

    /// Shared HS256 secret
    #[serde(default, skip_serializing)]
    pub jwt_secret: Option<String>,

    /// Task name → RS256 public key PEM file
    #[serde(default)]
    pub public_keys: BTreeMap<String, PathBuf>,

    /// Warehouse table approved comments are inserted into
    #[serde(default = "default_comments_table")]
    pub comments_table: String,
}

fn default_enabled() -> bool {
    true
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./gbads-comments")
}

fn default_app() -> String {
    "slackbot_comments_move".to_string()
}

fn default_comments_table() -> String {
    "gbads_comments".to_string()
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            store_root: default_store_root(),
            app: default_app(),
            jwt_secret: None,
            public_keys: BTreeMap::new(),
            comments_table: default_comments_table(),
        }
    }
}

impl ModerationConfig {
    /// Validate settings
    pub fn validate(&self) -> ModerationResult<()> {
        if self.app.trim().is_empty() {
            return Err(ModerationError::Config("app must not be empty".into()));
        }
        if self.comments_table.trim().is_empty() {
            return Err(ModerationError::Config("comments_table must not be empty".into()));
        }
        for task in self.public_keys.keys() {
            task.parse::<ModerationTask>()?;
        }
        Ok(())
    }

    /// Build the token authorizer. Per-task public keys take precedence over
    /// the shared secret.
    pub fn authorizer(&self) -> ModerationResult<Arc<dyn Authorizer>> {
        if !self.public_keys.is_empty() {
            let mut keys = Vec::with_capacity(self.public_keys.len());
            for (task, path) in &self.public_keys {
                let pem = fs::read(path).map_err(|e| {
                    ModerationError::Config(format!("cannot read {}: {}", path.display(), e))
                })?;
                keys.push((task.parse::<ModerationTask>()?, pem));
            }
            return Ok(Arc::new(JwtAuthorizer::rs256(self.app.clone(), &keys)?));
        }

        match &self.jwt_secret {
            Some(secret) if !secret.is_empty() => Ok(Arc::new(JwtAuthorizer::hs256(
                self.app.clone(),
                secret.as_bytes(),
            ))),
            _ => Err(ModerationError::Config(
                "moderation needs public_keys or jwt_secret".into(),
            )),
        }
    }
}
