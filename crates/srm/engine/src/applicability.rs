//! Candidate filtering: exact classification, side and pressurization,
//! then the inclusive numeric envelope.

use srm_types::{DamageContext, Location, Rule};

/// The three exact-match keys every assessment needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub damage_type: &'a str,
    pub structure: &'a str,
    pub zone: &'a str,
}

impl<'a> Classification<'a> {
    /// `None` when `damage.type`, `damage.structure` or `location.zone` is
    /// absent or empty.
    pub fn of(ctx: &'a DamageContext) -> Option<Self> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }
        Some(Self {
            damage_type: present(&ctx.damage.damage_type)?,
            structure: present(&ctx.damage.structure)?,
            zone: present(&ctx.location.zone)?,
        })
    }

    /// First-stage match: enabled, exact classification, side and
    /// pressurization.
    pub fn matches(&self, rule: &Rule, location: &Location) -> bool {
        rule.enabled
            && rule.damage_type == self.damage_type
            && rule.structure_zone == self.zone
            && rule.structure == self.structure
            && rule.side.admits(location.side.unwrap_or_default())
            && pressurization_matches(rule.pressurized, location.pressurized)
    }
}

/// Unset on either side matches anything.
fn pressurization_matches(rule: Option<bool>, context: Option<bool>) -> bool {
    match (rule, context) {
        (Some(rule), Some(context)) => rule == context,
        _ => true,
    }
}

/// Inclusive range check. An absent value is unconstrained, as is a missing
/// bound.
pub fn within_range<T: PartialOrd>(value: Option<T>, min: Option<T>, max: Option<T>) -> bool {
    let Some(value) = value else {
        return true;
    };
    if min.is_some_and(|min| value < min) {
        return false;
    }
    if max.is_some_and(|max| value > max) {
        return false;
    }
    true
}

/// Second-stage match: STA, WL and stringer envelopes.
pub(crate) fn within_envelope(rule: &Rule, location: &Location) -> bool {
    within_range(location.sta, rule.sta_min, rule.sta_max)
        && within_range(location.wl, rule.wl_min, rule.wl_max)
        && within_range(location.stringer_num, rule.stringer_min, rule.stringer_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use srm_types::{NewRule, RuleId, RuleSetId, Side};

    fn rule() -> Rule {
        NewRule::new("dent", "skin", "fuselage").into_rule(RuleId::new(1), RuleSetId::new(1))
    }

    fn ctx(side: Option<Side>, pressurized: Option<bool>) -> DamageContext {
        let mut ctx = DamageContext::default();
        ctx.damage.damage_type = Some("dent".to_string());
        ctx.damage.structure = Some("skin".to_string());
        ctx.location.zone = Some("fuselage".to_string());
        ctx.location.side = side;
        ctx.location.pressurized = pressurized;
        ctx
    }

    #[test]
    fn test_classification_requires_all_three_keys() {
        assert!(Classification::of(&ctx(None, None)).is_some());

        let mut missing = ctx(None, None);
        missing.damage.structure = None;
        assert!(Classification::of(&missing).is_none());

        let mut empty = ctx(None, None);
        empty.location.zone = Some(String::new());
        assert!(Classification::of(&empty).is_none());
    }

    #[test]
    fn test_classification_is_exact() {
        let context = ctx(None, None);
        let class = Classification::of(&context).unwrap();
        let mut other = rule();
        other.structure = "Skin".to_string();
        assert!(class.matches(&rule(), &context.location));
        assert!(!class.matches(&other, &context.location));
    }

    #[test]
    fn test_disabled_rules_never_match() {
        let context = ctx(None, None);
        let class = Classification::of(&context).unwrap();
        let mut disabled = rule();
        disabled.enabled = false;
        assert!(!class.matches(&disabled, &context.location));
    }

    #[test]
    fn test_side_matching() {
        let mut lh_rule = rule();
        lh_rule.side = Side::Lh;

        for (side, expected) in [
            (Some(Side::Lh), true),
            (Some(Side::Rh), false),
            (Some(Side::Any), true),
            (None, true),
        ] {
            let context = ctx(side, None);
            let class = Classification::of(&context).unwrap();
            assert_eq!(class.matches(&lh_rule, &context.location), expected, "{side:?}");
        }
    }

    #[test]
    fn test_pressurization_tri_state() {
        let mut pressurized_rule = rule();
        pressurized_rule.pressurized = Some(true);

        for (pressurized, expected) in [(Some(true), true), (Some(false), false), (None, true)] {
            let context = ctx(None, pressurized);
            let class = Classification::of(&context).unwrap();
            assert_eq!(class.matches(&pressurized_rule, &context.location), expected);
        }

        let context = ctx(None, Some(false));
        let class = Classification::of(&context).unwrap();
        assert!(class.matches(&rule(), &context.location));
    }

    #[test]
    fn test_ranges_are_inclusive_and_open_ended() {
        assert!(within_range(Some(1200.0), Some(1200.0), Some(1300.0)));
        assert!(within_range(Some(1300.0), Some(1200.0), Some(1300.0)));
        assert!(!within_range(Some(1300.5), Some(1200.0), Some(1300.0)));
        assert!(!within_range(Some(1199.9), Some(1200.0), None));
        assert!(within_range(Some(9999.0), Some(1200.0), None));
        assert!(within_range(None, Some(1200.0), Some(1300.0)));
        assert!(within_range::<i64>(Some(7), None, None));
    }

    #[test]
    fn test_envelope_ignores_missing_context_values() {
        let mut bounded = rule();
        bounded.wl_min = Some(100.0);
        bounded.wl_max = Some(200.0);
        bounded.stringer_min = Some(10);
        bounded.stringer_max = Some(14);

        let mut location = Location::default();
        assert!(within_envelope(&bounded, &location));

        location.stringer_num = Some(15);
        assert!(!within_envelope(&bounded, &location));
        location.stringer_num = Some(14);
        location.wl = Some(250.0);
        assert!(!within_envelope(&bounded, &location));
    }
}
