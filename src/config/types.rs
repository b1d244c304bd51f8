//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::harness::HarnessConfig;

/// Environment variable that overrides `database.path`.
pub const DATABASE_PATH_ENV: &str = "RESTODB_PATH";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tool configuration shared by the migrator and the validation harness.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Datastore location and connection behaviour.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Fixture settings for the validation harness.
    #[serde(default)]
    pub harness: HarnessConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from `path` if it exists, otherwise use defaults.
    ///
    /// The `RESTODB_PATH` environment variable is applied afterwards in both cases.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        config.apply_database_override(std::env::var(DATABASE_PATH_ENV).ok());
        Ok(config)
    }

    /// Replace the datastore path when an override is present and non-empty.
    pub fn apply_database_override(&mut self, value: Option<String>) {
        if let Some(path) = value
            && !path.trim().is_empty()
        {
            self.database.path = path;
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, or `:memory:`. Relative paths resolve
    /// against the current working directory.
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Create the database file when it does not exist.
    #[serde(default)]
    pub create_if_missing: bool,
    /// Run `PRAGMA integrity_check` after opening.
    #[serde(default = "default_true")]
    pub integrity_check: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            create_if_missing: false,
            integrity_check: true,
        }
    }
}

fn default_database_path() -> String {
    "database/restaurant.db".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_database_path() {
        let config = Config::default();
        assert_eq!(config.database.path, "database/restaurant.db");
        assert!(!config.database.create_if_missing);
        assert!(config.database.integrity_check);
        assert!(Path::new(&config.database.path).is_relative());
    }

    #[test]
    fn config_parses_empty_document() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, "database/restaurant.db");
        assert_eq!(config.harness.customer.email, "customer@test.com");
    }

    #[test]
    fn config_parses_database_section() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "/srv/app/restaurant.db"
            create_if_missing = true
            integrity_check = false
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, "/srv/app/restaurant.db");
        assert!(config.database.create_if_missing);
        assert!(!config.database.integrity_check);
    }

    #[test]
    fn config_rejects_malformed_toml() {
        let result: Result<Config, _> = toml::from_str("[database\npath = 1");
        assert!(result.is_err());
    }

    #[test]
    fn database_override_replaces_path() {
        let mut config = Config::default();
        config.apply_database_override(Some("other.db".to_string()));
        assert_eq!(config.database.path, "other.db");
    }

    #[test]
    fn database_override_ignores_blank_value() {
        let mut config = Config::default();
        config.apply_database_override(Some("  ".to_string()));
        assert_eq!(config.database.path, "database/restaurant.db");
        config.apply_database_override(None);
        assert_eq!(config.database.path, "database/restaurant.db");
    }

    #[test]
    fn load_or_default_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(!config.database.path.is_empty());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notify.toml");
        std::fs::write(
            &path,
            "[harness.customer]\nemail = \"qa@example.com\"\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.harness.customer.email, "qa@example.com");
        assert_eq!(config.harness.customer.name, "Test Customer");
    }
}
