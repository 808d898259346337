//! Condition evaluation over the damage context.

use crate::Verdict;
use serde_json::Value;
use srm_types::{resolve_path, CompareOp, Conditions, DamageContext, StoredClause};
use std::cmp::Ordering;

/// Evaluate `conditions` against a context.
///
/// `document` is the JSON view of `ctx` that clause fields are resolved
/// against. The first failing check stops evaluation.
pub fn evaluate_conditions(conditions: &Conditions, ctx: &DamageContext, document: &Value) -> Verdict {
    if conditions.requires_no_visible_crack && ctx.damage.visible_crack == Some(true) {
        return Verdict::reject("Condition failed: visible crack present.");
    }

    if let Some(clause) = conditions
        .deny_if
        .iter()
        .find(|clause| clause_holds(clause, document))
    {
        return Verdict::reject(format!("Denied by condition: {clause}"));
    }

    if let Some(clause) = conditions
        .allow_if
        .iter()
        .find(|clause| !clause_holds(clause, document))
    {
        return Verdict::reject(format!("Allow-if condition not met: {clause}"));
    }

    Verdict::pass()
}

/// An unreadable clause never holds.
fn clause_holds(entry: &StoredClause, document: &Value) -> bool {
    entry.clause().is_some_and(|clause| {
        compare_values(resolve_path(document, &clause.field), clause.op, &clause.value)
    })
}

/// Compare a resolved field against a clause literal.
///
/// `==` and `!=` treat an absent field as `null`; ordering operators are
/// false when the field is absent or the types do not compare.
pub fn compare_values(actual: Option<&Value>, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(actual, expected),
        CompareOp::Ne => !values_equal(actual, expected),
        ordering_op => {
            let Some(ordering) = actual.and_then(|actual| order(actual, expected)) else {
                return false;
            };
            match ordering_op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Ge => ordering != Ordering::Less,
                CompareOp::Eq | CompareOp::Ne => false,
            }
        }
    }
}

fn values_equal(actual: Option<&Value>, expected: &Value) -> bool {
    match (actual, expected) {
        (None, Value::Null) => true,
        (None, _) => false,
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Some(actual), expected) => actual == expected,
    }
}

fn order(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use srm_types::{Clause, Document};

    fn ctx() -> DamageContext {
        serde_json::from_value(json!({
            "location": {"zone": "fuselage", "side": "LH", "sta": 1250, "stringer_num": 12},
            "damage": {"type": "dent", "structure": "skin", "depth_mm": 1.5, "near_fastener_row": true}
        }))
        .unwrap()
    }

    fn run(conditions: &str, ctx: &DamageContext) -> Verdict {
        let conditions = Conditions::decode(conditions).unwrap();
        evaluate_conditions(&conditions, ctx, &ctx.to_document())
    }

    #[test]
    fn test_empty_conditions_pass() {
        assert_eq!(run("{}", &ctx()), Verdict::pass());
    }

    #[test]
    fn test_visible_crack_flag() {
        let mut cracked = ctx();
        cracked.damage.visible_crack = Some(true);
        let verdict = run(r#"{"requires_no_visible_crack": true}"#, &cracked);
        assert!(!verdict.passed);
        assert_eq!(verdict.reasons, vec!["Condition failed: visible crack present."]);

        assert!(run(r#"{"requires_no_visible_crack": true}"#, &ctx()).passed);
        assert!(run(r#"{"requires_no_visible_crack": false}"#, &cracked).passed);
    }

    #[test]
    fn test_deny_if_rejects_on_first_true_clause() {
        let verdict = run(
            r#"{"deny_if": [
                {"field": "damage.depth_mm", "op": ">", "value": 5},
                {"field": "damage.near_fastener_row", "op": "==", "value": true},
                {"field": "location.sta", "op": ">", "value": 0}
            ]}"#,
            &ctx(),
        );
        assert!(!verdict.passed);
        assert_eq!(
            verdict.reasons,
            vec!["Denied by condition: damage.near_fastener_row == true"]
        );
    }

    #[test]
    fn test_allow_if_requires_every_clause() {
        assert!(run(
            r#"{"allow_if": [
                {"field": "location.side", "op": "==", "value": "LH"},
                {"field": "location.stringer_num", "op": "<=", "value": 12}
            ]}"#,
            &ctx(),
        )
        .passed);

        let verdict = run(
            r#"{"allow_if": [{"field": "location.wl", "op": ">=", "value": 100}]}"#,
            &ctx(),
        );
        assert_eq!(
            verdict.reasons,
            vec!["Allow-if condition not met: location.wl >= 100"]
        );
    }

    #[test]
    fn test_unreadable_clause_never_holds() {
        let unreadable = StoredClause::Unreadable(json!({"field": "damage.depth_mm", "op": "=", "value": 1.5}));
        let conditions = Conditions {
            deny_if: vec![unreadable.clone()],
            ..Conditions::default()
        };
        assert!(evaluate_conditions(&conditions, &ctx(), &ctx().to_document()).passed);

        let conditions = Conditions {
            allow_if: vec![
                StoredClause::Readable(Clause {
                    field: "location.side".to_string(),
                    op: CompareOp::Eq,
                    value: json!("LH"),
                }),
                unreadable,
            ],
            ..Conditions::default()
        };
        let verdict = evaluate_conditions(&conditions, &ctx(), &ctx().to_document());
        assert!(!verdict.passed);
        assert_eq!(
            verdict.reasons,
            vec![r#"Allow-if condition not met: {"field":"damage.depth_mm","op":"=","value":1.5}"#]
        );
    }

    #[test]
    fn test_ordering_fails_closed_on_absent_field() {
        for op in [CompareOp::Lt, CompareOp::Le, CompareOp::Gt, CompareOp::Ge] {
            assert!(!compare_values(None, op, &json!(1)));
        }
    }

    #[test]
    fn test_equality_treats_absent_as_null() {
        assert!(compare_values(None, CompareOp::Eq, &Value::Null));
        assert!(!compare_values(None, CompareOp::Eq, &json!(false)));
        assert!(compare_values(None, CompareOp::Ne, &json!(false)));
    }

    #[test]
    fn test_numbers_compare_across_representations() {
        assert!(compare_values(Some(&json!(12)), CompareOp::Eq, &json!(12.0)));
        assert!(compare_values(Some(&json!(1.5)), CompareOp::Lt, &json!(2)));
        assert!(compare_values(Some(&json!(2)), CompareOp::Ge, &json!(2.0)));
    }

    #[test]
    fn test_strings_and_bools() {
        assert!(compare_values(Some(&json!("LH")), CompareOp::Lt, &json!("RH")));
        assert!(compare_values(Some(&json!(false)), CompareOp::Lt, &json!(true)));
        assert!(compare_values(Some(&json!("LH")), CompareOp::Ne, &json!("RH")));
    }

    #[test]
    fn test_mixed_types_are_unequal_and_unordered() {
        assert!(!compare_values(Some(&json!("12")), CompareOp::Eq, &json!(12)));
        assert!(compare_values(Some(&json!("12")), CompareOp::Ne, &json!(12)));
        assert!(!compare_values(Some(&json!("12")), CompareOp::Le, &json!(12)));
        assert!(!compare_values(Some(&json!(true)), CompareOp::Gt, &json!(0)));
    }

    #[test]
    fn test_missing_intermediate_path_is_absent() {
        let verdict = run(
            r#"{"deny_if": [{"field": "damage.type.subtype", "op": "==", "value": null}]}"#,
            &ctx(),
        );
        assert!(!verdict.passed);
    }
}
