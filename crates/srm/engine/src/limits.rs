//! Numeric limit checks against the damage measurements.

use crate::Verdict;
use srm_types::{Damage, Limits};

/// Check every configured limit; all violations are reported.
///
/// Diameter and depth are only checked when measured. A ratio limit with no
/// ratio in the context is a failure, and so is any limit whose stored value
/// is not a number.
pub fn evaluate_limits(limits: &Limits, damage: &Damage) -> Verdict {
    let mut reasons: Vec<String> = limits
        .unreadable
        .iter()
        .map(|(key, value)| format!("Limit {key} is not a number: {value}"))
        .collect();

    if let (Some(limit), Some(diameter)) = (limits.max_diameter_mm, damage.diameter_mm) {
        if diameter > limit {
            reasons.push(format!("Diameter {diameter}mm > limit {limit}mm"));
        }
    }

    if let (Some(limit), Some(depth)) = (limits.max_depth_mm, damage.depth_mm) {
        if depth > limit {
            reasons.push(format!("Depth {depth}mm > limit {limit}mm"));
        }
    }

    if let Some(limit) = limits.max_depth_to_thickness_ratio {
        match damage.depth_to_thickness_ratio {
            None => reasons.push("Depth/thickness ratio not provided (needed for this rule).".to_string()),
            Some(ratio) if ratio > limit => reasons.push(format!("Ratio {ratio:.2} > limit {limit}")),
            Some(_) => {}
        }
    }

    Verdict {
        passed: reasons.is_empty(),
        reasons,
    }
}
