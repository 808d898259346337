//! Rule-set snapshots decoded for evaluation.

use serde::{Deserialize, Serialize};
use srm_types::{
    Actions, Conditions, Document, DocumentError, Limits, Rule, RuleSet, RuleSetSnapshot,
    Salvaged,
};
use std::cmp::Reverse;
use tracing::warn;

/// What to do with a stored decision document that fails to decode.
///
/// Blank and `null` documents are always the empty document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredDocumentPolicy {
    /// Keep the rule. An object is decoded key by key: a non-numeric limit
    /// fails the rule and an unreadable clause never holds. Text that is not
    /// a JSON object is treated as the empty document.
    #[default]
    Lenient,
    /// Drop the rule from the candidate list
    Reject,
}

/// A rule with its decision documents decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub rule: Rule,
    pub conditions: Conditions,
    pub limits: Limits,
    pub actions: Actions,
}

impl CompiledRule {
    /// Decode the stored documents of `rule`. Returns `None` only when the
    /// policy is [`StoredDocumentPolicy::Reject`] and a document is malformed.
    pub fn compile(rule: Rule, policy: StoredDocumentPolicy) -> Option<Self> {
        let conditions = decode::<Conditions>(&rule, &rule.conditions_json, policy)?;
        let limits = decode::<Limits>(&rule, &rule.limits_json, policy)?;
        let actions = decode::<Actions>(&rule, &rule.actions_json, policy)?;
        Some(Self {
            rule,
            conditions,
            limits,
            actions,
        })
    }
}

fn decode<D: Document>(rule: &Rule, raw: &str, policy: StoredDocumentPolicy) -> Option<D> {
    match policy {
        StoredDocumentPolicy::Lenient => match D::decode_salvaged(raw) {
            Ok(Salvaged { document, problems }) => {
                let kind = D::KIND;
                for problem in &problems {
                    warn!(
                        rule_id = %rule.id,
                        document = %kind,
                        error = %problem,
                        "Unreadable stored document entry"
                    );
                }
                Some(document)
            }
            Err(DocumentError { kind, message }) => {
                warn!(
                    rule_id = %rule.id,
                    document = %kind,
                    error = %message,
                    "Malformed stored document treated as empty"
                );
                Some(D::default())
            }
        },
        StoredDocumentPolicy::Reject => match D::decode(raw) {
            Ok(document) => Some(document),
            Err(DocumentError { kind, message }) => {
                warn!(
                    rule_id = %rule.id,
                    document = %kind,
                    error = %message,
                    "Rule with malformed stored document excluded"
                );
                None
            }
        },
    }
}

/// An in-memory rule set, rules in evaluation order
/// (`priority` descending, then `id` ascending).
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRuleSet {
    pub rule_set: RuleSet,
    pub rules: Vec<CompiledRule>,
}

impl CompiledRuleSet {
    pub fn compile(snapshot: RuleSetSnapshot, policy: StoredDocumentPolicy) -> Self {
        let mut rules: Vec<CompiledRule> = snapshot
            .rules
            .into_iter()
            .filter_map(|rule| CompiledRule::compile(rule, policy))
            .collect();
        rules.sort_by_key(|c| (Reverse(c.rule.priority), c.rule.id));
        Self {
            rule_set: snapshot.rule_set,
            rules,
        }
    }
}
