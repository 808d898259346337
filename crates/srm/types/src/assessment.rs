//! Assessment results

use crate::documents::Actions;
use crate::ids::RuleId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Disposition used whenever no rule clearly passes
pub const ENGINEERING_REVIEW: &str = "ENGINEERING_REVIEW";

/// Severity attached to every escalation result
pub const ESCALATION_SEVERITY: &str = "engineering";

/// Terminal state of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A rule fully satisfied its limits
    Pass,
    /// No rule passed, the highest-priority limit failure is reported
    Fail,
    /// No candidate survived filtering and conditions
    NoMatch,
    /// `damage.type`, `damage.structure` or `location.zone` is missing
    MissingClassification,
    /// No rule set exists for the family (or requested revision)
    NoRuleSet,
    /// The rule store could not be read
    StoreUnavailable,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Pass => "pass",
            Outcome::Fail => "fail",
            Outcome::NoMatch => "no_match",
            Outcome::MissingClassification => "missing_classification",
            Outcome::NoRuleSet => "no_rule_set",
            Outcome::StoreUnavailable => "store_unavailable",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traceable verdict for one damage context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub rule_id: Option<RuleId>,
    pub passed: bool,
    pub outcome: Outcome,
    pub disposition: String,
    pub severity: String,
    pub srm_ref: Option<String>,
    /// Explanations in the order they were encountered
    pub reasons: Vec<String>,
    pub actions: Actions,
}

impl AssessmentResult {
    /// A rule-free `ENGINEERING_REVIEW` result.
    pub fn escalation(outcome: Outcome, reason: impl Into<String>, next_step: &str) -> Self {
        Self {
            rule_id: None,
            passed: false,
            outcome,
            disposition: ENGINEERING_REVIEW.to_string(),
            severity: ESCALATION_SEVERITY.to_string(),
            srm_ref: None,
            reasons: vec![reason.into()],
            actions: Actions::escalation(next_step),
        }
    }

    pub fn missing_classification() -> Self {
        Self::escalation(
            Outcome::MissingClassification,
            "Missing required classification (damage.type / damage.structure / location.zone).",
            "Provide missing details.",
        )
    }

    pub fn no_rule_set(family: &str, revision: Option<&str>) -> Self {
        let reason = match revision {
            Some(revision) => format!(
                "No rule_set found for aircraft_family={family}, revision={revision}."
            ),
            None => format!("No rule_set found for aircraft_family={family}."),
        };
        Self::escalation(
            Outcome::NoRuleSet,
            reason,
            "Seed the rule store for this aircraft family.",
        )
    }

    /// No rule matched the damage classification at all.
    pub fn no_matching_rules() -> Self {
        Self::escalation(
            Outcome::NoMatch,
            "No matching rules found; escalate to engineering.",
            "Add rules for this case.",
        )
    }

    /// Rules matched the classification but none survived range filtering
    /// and conditions.
    pub fn no_applicable_rule() -> Self {
        Self::escalation(
            Outcome::NoMatch,
            "No applicable rule after filtering; escalate to engineering.",
            "Capture more location detail.",
        )
    }

    pub fn store_unavailable(error: impl fmt::Display) -> Self {
        Self::escalation(
            Outcome::StoreUnavailable,
            format!("Rule store unavailable: {error}"),
            "Retry once the rule store is reachable.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalations_never_pass() {
        for result in [
            AssessmentResult::missing_classification(),
            AssessmentResult::no_rule_set("B787", None),
            AssessmentResult::no_matching_rules(),
            AssessmentResult::no_applicable_rule(),
            AssessmentResult::store_unavailable("disk full"),
        ] {
            assert!(!result.passed);
            assert_eq!(result.disposition, ENGINEERING_REVIEW);
            assert_eq!(result.actions.disposition(), ENGINEERING_REVIEW);
            assert_eq!(result.rule_id, None);
            assert_eq!(result.severity, ESCALATION_SEVERITY);
        }
    }

    #[test]
    fn test_no_rule_set_names_the_revision() {
        let result = AssessmentResult::no_rule_set("B787", Some("REV-9"));
        assert_eq!(
            result.reasons,
            vec!["No rule_set found for aircraft_family=B787, revision=REV-9.".to_string()]
        );
    }

    #[test]
    fn test_outcome_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Outcome::MissingClassification).unwrap(),
            "\"missing_classification\""
        );
        assert_eq!(Outcome::NoRuleSet.to_string(), "no_rule_set");
    }
}
