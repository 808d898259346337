//! Store-backed rule evaluation.

use crate::applicability::Classification;
use crate::selection::assess;
use crate::snapshot::{CompiledRuleSet, StoredDocumentPolicy};
use srm_storage::RuleStore;
use srm_types::{AssessmentResult, DamageContext};
use std::sync::Arc;
use tracing::{info, warn};

/// Store-backed evaluation entry point.
///
/// Each call reads one rule-set snapshot and evaluates against it; no state
/// is kept between calls, so an `Advisor` can be shared freely.
#[derive(Clone)]
pub struct Advisor {
    store: Arc<dyn RuleStore>,
    policy: StoredDocumentPolicy,
}

impl Advisor {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self {
            store,
            policy: StoredDocumentPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StoredDocumentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Evaluate `ctx` against the rule set for `family`, pinned to
    /// `revision` when given. Never fails: every uncertain outcome is an
    /// `ENGINEERING_REVIEW` result.
    pub async fn evaluate(
        &self,
        family: &str,
        ctx: &DamageContext,
        revision: Option<&str>,
    ) -> AssessmentResult {
        let revision = revision.filter(|r| !r.is_empty());
        let result = self.run(family, ctx, revision).await;
        info!(
            family,
            revision = revision.unwrap_or("latest"),
            outcome = %result.outcome,
            rule_id = ?result.rule_id.map(|id| id.get()),
            disposition = %result.disposition,
            "Assessment complete"
        );
        result
    }

    async fn run(
        &self,
        family: &str,
        ctx: &DamageContext,
        revision: Option<&str>,
    ) -> AssessmentResult {
        if Classification::of(ctx).is_none() {
            return AssessmentResult::missing_classification();
        }

        let rule_set = match self.store.resolve_rule_set(family, revision).await {
            Ok(Some(rule_set)) => rule_set,
            Ok(None) => return AssessmentResult::no_rule_set(family, revision),
            Err(e) => {
                warn!(family, error = %e, "Rule set lookup failed");
                return AssessmentResult::store_unavailable(e);
            }
        };

        let snapshot = match self.store.snapshot(rule_set.id).await {
            Ok(Some(snapshot)) => snapshot,
            // deleted between lookup and read
            Ok(None) => return AssessmentResult::no_rule_set(family, revision),
            Err(e) => {
                warn!(family, rule_set_id = %rule_set.id, error = %e, "Rule set read failed");
                return AssessmentResult::store_unavailable(e);
            }
        };

        assess(&CompiledRuleSet::compile(snapshot, self.policy), ctx)
    }
}
