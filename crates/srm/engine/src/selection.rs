//! Selection policy: one deterministic verdict per context.

use crate::applicability::{within_envelope, Classification};
use crate::conditions::evaluate_conditions;
use crate::limits::evaluate_limits;
use crate::snapshot::{CompiledRule, CompiledRuleSet};
use srm_types::{AssessmentResult, DamageContext, Outcome};
use tracing::debug;

/// Evaluate `ctx` against a compiled rule set.
///
/// Candidates are scanned in evaluation order. The first rule whose
/// conditions and limits both pass is returned. Otherwise the first rule that
/// failed its limits is reported, and with no such rule the result is an
/// escalation.
pub fn assess(rule_set: &CompiledRuleSet, ctx: &DamageContext) -> AssessmentResult {
    let Some(class) = Classification::of(ctx) else {
        return AssessmentResult::missing_classification();
    };
    let location = &ctx.location;

    let mut candidates = rule_set
        .rules
        .iter()
        .filter(|c| class.matches(&c.rule, location))
        .peekable();
    if candidates.peek().is_none() {
        return AssessmentResult::no_matching_rules();
    }

    let document = ctx.to_document();
    let mut best_fail: Option<AssessmentResult> = None;

    for compiled in candidates {
        let rule_id = compiled.rule.id;
        if !within_envelope(&compiled.rule, location) {
            debug!(rule_id = %rule_id, "Outside location envelope");
            continue;
        }

        let conditions = evaluate_conditions(&compiled.conditions, ctx, &document);
        if !conditions.passed {
            debug!(rule_id = %rule_id, reasons = ?conditions.reasons, "Skipped by conditions");
            continue;
        }

        let limits = evaluate_limits(&compiled.limits, &ctx.damage);
        if limits.passed {
            debug!(rule_id = %rule_id, "Within limits");
            return verdict(compiled, true, vec!["Within limits.".to_string()]);
        }

        debug!(rule_id = %rule_id, reasons = ?limits.reasons, "Limits exceeded");
        if best_fail.is_none() {
            let reasons = if limits.reasons.is_empty() {
                vec!["Out of limits.".to_string()]
            } else {
                limits.reasons
            };
            best_fail = Some(verdict(compiled, false, reasons));
        }
    }

    best_fail.unwrap_or_else(AssessmentResult::no_applicable_rule)
}

fn verdict(compiled: &CompiledRule, passed: bool, reasons: Vec<String>) -> AssessmentResult {
    AssessmentResult {
        rule_id: Some(compiled.rule.id),
        passed,
        outcome: if passed { Outcome::Pass } else { Outcome::Fail },
        disposition: compiled.actions.disposition().to_string(),
        severity: compiled.rule.severity.clone(),
        srm_ref: compiled.rule.srm_ref.clone(),
        reasons,
        actions: compiled.actions.clone(),
    }
}
