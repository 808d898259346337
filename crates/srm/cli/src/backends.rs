//! Storage wiring for CLI commands

use crate::config::StorageConfig;
use crate::error::CliResult;
use srm_storage::{AssessmentLog, InMemoryStorage, RuleStore, SqliteStorage};
use std::sync::Arc;
use tracing::debug;

/// The rule store and assessment log a command runs against
#[derive(Clone)]
pub struct Backends {
    pub rules: Arc<dyn RuleStore>,
    pub log: Arc<dyn AssessmentLog>,
}

impl Backends {
    pub async fn open(config: &StorageConfig) -> CliResult<Self> {
        match config {
            StorageConfig::Memory => {
                debug!("Using in-memory storage");
                let storage = Arc::new(InMemoryStorage::new());
                Ok(Self {
                    rules: storage.clone(),
                    log: storage,
                })
            }
            StorageConfig::Sqlite {
                rules_url,
                assessments_url,
                max_connections,
            } => {
                debug!(rules_url, assessments_url, "Opening SQLite storage");
                let rules = Arc::new(
                    SqliteStorage::connect_with_options(rules_url, *max_connections).await?,
                );
                let log: Arc<dyn AssessmentLog> = if assessments_url == rules_url {
                    rules.clone()
                } else {
                    Arc::new(
                        SqliteStorage::connect_with_options(assessments_url, *max_connections)
                            .await?,
                    )
                };
                Ok(Self { rules, log })
            }
        }
    }
}
