//! SRM advisor core types.
//!
//! Shared vocabulary for the rule store, the seed loader and the rule
//! evaluation engine:
//! - versioned rule sets and the rules they own
//! - the typed `conditions` / `limits` / `actions` documents carried by a rule
//! - the damage context submitted for assessment
//! - the traceable assessment result returned by the engine

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod assessment;
mod context;
mod documents;
mod ids;
mod rule;
mod rule_set;

pub use assessment::{AssessmentResult, Outcome, ENGINEERING_REVIEW, ESCALATION_SEVERITY};
pub use context::{resolve_path, Damage, DamageContext, Location};
pub use documents::{
    Actions, Clause, CompareOp, Conditions, Document, DocumentError, DocumentKind, Limits,
    Salvaged, StoredClause,
};
pub use ids::{RuleId, RuleSetId};
pub use rule::{NewRule, Rule, Side, SideParseError};
pub use rule_set::{LoadMode, LoadReceipt, NewRuleSet, RuleSet, RuleSetSnapshot};
