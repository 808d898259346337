//! Rule sets: one versioned collection of rules per aircraft family/revision

use crate::ids::RuleSetId;
use crate::rule::Rule;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Rule set metadata as supplied by a seed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRuleSet {
    pub name: String,
    pub aircraft_family: String,
    pub revision: String,
    pub effective_date: Option<String>,
    pub source: Option<String>,
}

impl NewRuleSet {
    pub fn into_rule_set(self, id: RuleSetId) -> RuleSet {
        RuleSet {
            id,
            name: self.name,
            aircraft_family: self.aircraft_family,
            revision: self.revision,
            effective_date: self.effective_date,
            source: self.source,
        }
    }
}

/// A persisted rule set. Lookup identity is `(aircraft_family, revision)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: RuleSetId,
    pub name: String,
    pub aircraft_family: String,
    pub revision: String,
    pub effective_date: Option<String>,
    pub source: Option<String>,
}

/// A consistent read of one rule set and all of its rules.
///
/// Rules are held in evaluation order: priority descending, then id
/// ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetSnapshot {
    pub rule_set: RuleSet,
    pub rules: Vec<Rule>,
}

impl RuleSetSnapshot {
    pub fn new(rule_set: RuleSet, mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|r| (Reverse(r.priority), r.id));
        Self { rule_set, rules }
    }
}

/// How a seed document is written against existing rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Always create a fresh rule set row
    AlwaysNew,
    /// Reuse the rule set matching `(family, revision)` and refresh its
    /// metadata; with `wipe`, drop its existing rules first
    Upsert { wipe: bool },
}

/// Outcome of a committed rule set write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReceipt {
    pub rule_set_id: RuleSetId,
    pub inserted_count: usize,
    /// Rules under the rule set after the write
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RuleId;
    use crate::rule::NewRule;

    fn rule(id: i64, priority: i64) -> Rule {
        let mut body = NewRule::new("dent", "skin", "fuselage");
        body.priority = priority;
        body.into_rule(RuleId::new(id), RuleSetId::new(1))
    }

    #[test]
    fn test_snapshot_orders_by_priority_then_id() {
        let rule_set = NewRuleSet {
            name: "demo".into(),
            aircraft_family: "B787".into(),
            revision: "DEMO-01".into(),
            effective_date: None,
            source: None,
        }
        .into_rule_set(RuleSetId::new(1));

        let snapshot =
            RuleSetSnapshot::new(rule_set, vec![rule(4, 5), rule(2, 10), rule(3, 5), rule(1, 0)]);
        let order: Vec<i64> = snapshot.rules.iter().map(|r| r.id.get()).collect();
        assert_eq!(order, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_load_mode_serde() {
        let mode: LoadMode = serde_json::from_str(r#"{"upsert":{"wipe":true}}"#).unwrap();
        assert_eq!(mode, LoadMode::Upsert { wipe: true });
        assert_eq!(serde_json::to_string(&LoadMode::AlwaysNew).unwrap(), "\"always_new\"");
    }
}
