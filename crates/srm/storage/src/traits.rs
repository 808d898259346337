use crate::model::{AssessmentRecord, NewAssessmentRecord};
use crate::StorageResult;
use async_trait::async_trait;
use srm_types::{LoadMode, LoadReceipt, NewRule, NewRuleSet, RuleSet, RuleSetId, RuleSetSnapshot};

/// A validated rule set document ready to be written in one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSetWrite {
    pub rule_set: NewRuleSet,
    pub rules: Vec<NewRule>,
    pub mode: LoadMode,
}

/// Storage interface for rule sets and their rules.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Find the rule set for a family, pinned to `revision` when given.
    /// The highest id wins when several match.
    async fn resolve_rule_set(
        &self,
        aircraft_family: &str,
        revision: Option<&str>,
    ) -> StorageResult<Option<RuleSet>>;

    /// List rule sets in id order, optionally for one family.
    async fn list_rule_sets(&self, aircraft_family: Option<&str>) -> StorageResult<Vec<RuleSet>>;

    /// Read a rule set together with all of its rules in evaluation order.
    async fn snapshot(&self, rule_set_id: RuleSetId) -> StorageResult<Option<RuleSetSnapshot>>;

    /// Apply a seed write atomically. Either the rule set and every rule are
    /// persisted, or nothing is.
    async fn write_rule_set(&self, write: RuleSetWrite) -> StorageResult<LoadReceipt>;

    /// Delete a rule set and every rule it owns.
    async fn delete_rule_set(&self, rule_set_id: RuleSetId) -> StorageResult<bool>;
}

/// Append-only log of past assessments.
#[async_trait]
pub trait AssessmentLog: Send + Sync {
    async fn append_assessment(
        &self,
        record: NewAssessmentRecord,
    ) -> StorageResult<AssessmentRecord>;

    /// Read records newest-first.
    async fn recent_assessments(&self, limit: usize) -> StorageResult<Vec<AssessmentRecord>>;
}
