//! CLI configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! file, then `SRM_*` environment variables (`SRM_LOGGING__LEVEL=debug`).

use serde::{Deserialize, Serialize};
use srm_engine::StoredDocumentPolicy;

/// Top-level CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    /// Values used when a command does not name them
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-local storage, gone when the command exits
    Memory,

    /// SQLite databases for rules and for the assessment log
    Sqlite {
        #[serde(default = "default_rules_url")]
        rules_url: String,

        #[serde(default = "default_assessments_url")]
        assessments_url: String,

        /// Maximum connections per pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            rules_url: default_rules_url(),
            assessments_url: default_assessments_url(),
            max_connections: default_pool_size(),
        }
    }
}

impl StorageConfig {
    /// Point the rule store and/or the assessment log at explicit databases.
    /// Either override switches a memory configuration to SQLite.
    pub fn with_overrides(self, rules_db: Option<&str>, assessments_db: Option<&str>) -> Self {
        if rules_db.is_none() && assessments_db.is_none() {
            return self;
        }
        let (rules_url, assessments_url, max_connections) = match self {
            StorageConfig::Sqlite {
                rules_url,
                assessments_url,
                max_connections,
            } => (rules_url, assessments_url, max_connections),
            StorageConfig::Memory => (
                default_rules_url(),
                default_assessments_url(),
                default_pool_size(),
            ),
        };
        StorageConfig::Sqlite {
            rules_url: rules_db.map(sqlite_url).unwrap_or(rules_url),
            assessments_url: assessments_db.map(sqlite_url).unwrap_or(assessments_url),
            max_connections,
        }
    }
}

/// Accept either a `sqlite:` URL or a plain file path.
pub fn sqlite_url(target: &str) -> String {
    if target.starts_with("sqlite:") {
        target.to_string()
    } else {
        format!("sqlite://{target}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_family")]
    pub aircraft_family: String,

    /// Unset means the most recently loaded rule set for the family
    #[serde(default)]
    pub revision: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            aircraft_family: default_family(),
            revision: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Handling of stored decision documents that fail to decode
    #[serde(default)]
    pub stored_documents: StoredDocumentPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_rules_url() -> String {
    "sqlite://rules.db".to_string()
}

fn default_assessments_url() -> String {
    "sqlite://assessments.db".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_family() -> String {
    "B787".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CliConfig {
    /// Load configuration: defaults, then `path` when given, then
    /// environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&CliConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SRM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert!(matches!(config.storage, StorageConfig::Sqlite { .. }));
        assert_eq!(config.defaults.aircraft_family, "B787");
        assert_eq!(config.defaults.revision, None);
        assert_eq!(config.engine.stored_documents, StoredDocumentPolicy::Lenient);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[storage]
type = "memory"

[defaults]
aircraft_family = "B777"
revision = "REV-3"

[engine]
stored_documents = "reject"
"#
        )
        .unwrap();

        let config = CliConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.defaults.aircraft_family, "B777");
        assert_eq!(config.defaults.revision.as_deref(), Some("REV-3"));
        assert_eq!(config.engine.stored_documents, StoredDocumentPolicy::Reject);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(CliConfig::load(Some("/nonexistent/srm-config.toml")).is_err());
    }

    #[test]
    fn test_database_overrides() {
        let storage = StorageConfig::Memory.with_overrides(Some("/tmp/rules.db"), None);
        assert_eq!(
            storage,
            StorageConfig::Sqlite {
                rules_url: "sqlite:///tmp/rules.db".to_string(),
                assessments_url: "sqlite://assessments.db".to_string(),
                max_connections: 5,
            }
        );
        assert_eq!(StorageConfig::Memory.with_overrides(None, None), StorageConfig::Memory);
        assert_eq!(sqlite_url("sqlite::memory:"), "sqlite::memory:");
    }
}
