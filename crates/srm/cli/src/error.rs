//! CLI error types

use srm_seed::SeedError;
use srm_storage::StorageError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Seed document rejected or not written
    #[error("Seed error: {0}")]
    Seed(#[from] SeedError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
