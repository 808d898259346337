use crate::{SeedDocument, SeedResult};
use serde_json::Value;
use srm_storage::{RuleSetWrite, RuleStore};
use srm_types::{LoadMode, LoadReceipt};
use std::sync::Arc;
use tracing::{info, warn};

/// Writes validated seed documents into a rule store.
#[derive(Clone)]
pub struct SeedLoader {
    store: Arc<dyn RuleStore>,
}

impl SeedLoader {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// Persist a validated document as one atomic write.
    pub async fn load(&self, document: SeedDocument, mode: LoadMode) -> SeedResult<LoadReceipt> {
        let family = document.rule_set.aircraft_family.clone();
        let revision = document.rule_set.revision.clone();

        let receipt = self
            .store
            .write_rule_set(RuleSetWrite {
                rule_set: document.rule_set,
                rules: document.rules,
                mode,
            })
            .await
            .map_err(|e| {
                warn!(%family, %revision, error = %e, "Seed write failed");
                e
            })?;

        info!(
            %family,
            %revision,
            rule_set_id = %receipt.rule_set_id,
            inserted = receipt.inserted_count,
            total = receipt.total_count,
            "Seed complete"
        );
        Ok(receipt)
    }

    /// Validate a raw document, then load it. Nothing is written when
    /// validation fails.
    pub async fn load_value(&self, value: &Value, mode: LoadMode) -> SeedResult<LoadReceipt> {
        let document = SeedDocument::from_value(value).map_err(|e| {
            warn!(error = %e, "Seed document rejected");
            e
        })?;
        self.load(document, mode).await
    }
}
