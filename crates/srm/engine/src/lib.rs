//! SRM rule evaluation engine.
//!
//! Evaluation is a pure function of a compiled rule-set snapshot and a
//! damage context:
//! 1. applicability: classification, side, pressurization and ranges
//! 2. conditions: `requires_no_visible_crack`, `deny_if`, `allow_if`
//! 3. limits: diameter, depth and depth/thickness ratio ceilings
//! 4. selection: first passing rule, else the highest-priority failure
//!
//! [`Advisor`] wraps the pure core with rule store access.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod advisor;
mod applicability;
mod conditions;
mod limits;
mod selection;
mod snapshot;

pub use advisor::Advisor;
pub use applicability::{within_range, Classification};
pub use conditions::{compare_values, evaluate_conditions};
pub use limits::evaluate_limits;
pub use selection::assess;
pub use snapshot::{CompiledRule, CompiledRuleSet, StoredDocumentPolicy};

/// Outcome of one evaluator stage together with its explanations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    /// Human-readable reasons in the order they were found
    pub reasons: Vec<String>,
}

impl Verdict {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reasons: Vec::new(),
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reasons: vec![reason.into()],
        }
    }
}
