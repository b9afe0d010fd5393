//! Runtime configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scorecard: ScorecardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScorecardConfig {
    /// Advisor whose roles are scored
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_filter() -> String {
    "advisor_scorecard=info".to_string()
}

impl Config {
    /// Reads the TOML file if it exists; a missing file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Values given on the command line or environment take precedence.
    pub fn with_overrides(mut self, database_url: Option<String>, owner_id: Option<Uuid>) -> Self {
        if database_url.is_some() {
            self.database.url = database_url;
        }
        if owner_id.is_some() {
            self.scorecard.owner_id = owner_id;
        }
        self
    }

    pub fn database_url(&self) -> anyhow::Result<&str> {
        self.database
            .url
            .as_deref()
            .context("DATABASE_URL must be set to a production Postgres instance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.filter, "advisor_scorecard=info");
        assert!(config.scorecard.owner_id.is_none());
        assert!(config.database_url().is_err());
    }

    #[test]
    fn parses_all_sections() {
        let config = Config::from_toml(
            r#"
[database]
url = "postgres://scorecard@localhost/scorecard"
max_connections = 12

[scorecard]
owner_id = "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2"

[logging]
filter = "advisor_scorecard=debug"
"#,
        )
        .unwrap();

        assert_eq!(config.database.max_connections, 12);
        assert_eq!(
            config.database_url().unwrap(),
            "postgres://scorecard@localhost/scorecard"
        );
        assert_eq!(
            config.scorecard.owner_id,
            Some(Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2").unwrap())
        );
        assert_eq!(config.logging.filter, "advisor_scorecard=debug");
    }

    #[test]
    fn overrides_replace_file_values() {
        let owner = Uuid::new_v4();
        let config = Config::from_toml("[database]\nurl = \"postgres://file\"\n")
            .unwrap()
            .with_overrides(Some("postgres://env".to_string()), Some(owner));
        assert_eq!(config.database_url().unwrap(), "postgres://env");
        assert_eq!(config.scorecard.owner_id, Some(owner));

        let kept = Config::from_toml("[database]\nurl = \"postgres://file\"\n")
            .unwrap()
            .with_overrides(None, None);
        assert_eq!(kept.database_url().unwrap(), "postgres://file");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.database.max_connections, 5);

        let path = dir.path().join("scorecard.toml");
        std::fs::write(&path, "[database]\nmax_connections = 2\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().database.max_connections, 2);
    }
}
