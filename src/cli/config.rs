//! Configuration file loading
//!
//! JSON file with per-section defaults. Warehouse credentials and the base
//! path may be overridden from the environment (`RDS_HOST`, `RDS_PORT`,
//! `RDS_NAME`, `RDS_USER`, `RDS_PASS`, `BASE_URL`).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::moderation::ModerationConfig;
use crate::observability::Severity;
use crate::warehouse::PgConfig;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub database: PgConfig,

    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Minimum log severity (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: HttpServerConfig::default(),
            database: PgConfig::default(),
            moderation: ModerationConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file, apply environment overrides, validate.
    ///
    /// A missing file yields the defaults so a deployment can be configured
    /// from the environment alone.
    pub fn load(path: &Path) -> CliResult<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| CliError::config_error(format!("failed to read config: {}", e)))?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RDS_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("RDS_PORT") {
            self.database.port = port
                .trim()
                .parse()
                .map_err(|_| CliError::config_error(format!("invalid RDS_PORT '{}'", port)))?;
        }
        if let Some(name) = lookup("RDS_NAME") {
            self.database.dbname = name;
        }
        if let Some(user) = lookup("RDS_USER") {
            self.database.user = user;
        }
        if let Some(pass) = lookup("RDS_PASS") {
            self.database.password = pass;
        }
        if let Some(base) = lookup("BASE_URL") {
            self.server.base_path = base;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> CliResult<()> {
        self.severity()?;
        if self.server.port == 0 {
            return Err(CliError::config_error("server.port must be > 0"));
        }
        if self.database.host.trim().is_empty() {
            return Err(CliError::config_error("database.host must not be empty"));
        }
        if self.moderation.enabled {
            self.moderation.validate()?;
        }
        Ok(())
    }

    /// Parsed log level
    pub fn severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            CliError::config_error(format!("invalid log_level '{}'", self.log_level))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.log_level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RDS_HOST", "warehouse.internal"),
            ("RDS_PORT", "6543"),
            ("RDS_USER", "reader"),
            ("BASE_URL", "/api"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database.host, "warehouse.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.user, "reader");
        assert_eq!(config.server.base_path, "/api");
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|k| (k == "RDS_PORT").then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert_eq!(err.code(), "GBADS_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gbads.json");
        fs::write(
            &path,
            r#"{"server": {"port": 9100}, "log_level": "warn", "moderation": {"enabled": false}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_invalid_log_level() {
        let config = Config {
            log_level: "loud".into(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
