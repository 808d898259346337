//! Field-level validation over raw JSON objects.
//!
//! Every check names the offending field by its full path
//! (`rules[3].limits.max_depth_mm`). Optional keys that are absent or `null`
//! take their typed default.

use crate::{SeedError, SeedResult};
use serde_json::{Map, Value};
use srm_types::{CompareOp, Side};

/// A JSON object together with the path that led to it.
pub(crate) struct Fields<'a> {
    object: &'a Map<String, Value>,
    path: String,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(value: &'a Value, path: impl Into<String>) -> SeedResult<Self> {
        let path = path.into();
        match value {
            Value::Object(object) => Ok(Self { object, path }),
            other => Err(SeedError::validation(
                path,
                format!("must be an object, got {}", type_name(other)),
            )),
        }
    }

    pub(crate) fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// The value under `key`, with `null` folded into absent.
    fn present(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|v| !v.is_null())
    }

    pub(crate) fn required(&self, key: &str) -> SeedResult<&'a Value> {
        match self.object.get(key) {
            None => Err(SeedError::validation(
                self.path_of(key),
                "missing required key",
            )),
            Some(Value::Null) => Err(SeedError::validation(self.path_of(key), "must not be null")),
            Some(value) => Ok(value),
        }
    }

    fn wrong_type(&self, key: &str, expected: &str, found: &Value) -> SeedError {
        SeedError::validation(
            self.path_of(key),
            format!("must be {expected}, got {}", type_name(found)),
        )
    }

    /// A required, non-empty string.
    pub(crate) fn required_str(&self, key: &str) -> SeedResult<String> {
        let value = self.required(key)?;
        let text = value
            .as_str()
            .ok_or_else(|| self.wrong_type(key, "a string", value))?;
        if text.trim().is_empty() {
            return Err(SeedError::validation(self.path_of(key), "must not be empty"));
        }
        Ok(text.to_string())
    }

    pub(crate) fn optional_str(&self, key: &str) -> SeedResult<Option<String>> {
        self.present(key)
            .map(|value| {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.wrong_type(key, "a string or null", value))
            })
            .transpose()
    }

    /// Any JSON number, integers included.
    pub(crate) fn optional_f64(&self, key: &str) -> SeedResult<Option<f64>> {
        self.present(key)
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| self.wrong_type(key, "a number or null", value))
            })
            .transpose()
    }

    /// An integer. Booleans and fractional numbers are rejected.
    pub(crate) fn optional_i64(&self, key: &str) -> SeedResult<Option<i64>> {
        self.present(key)
            .map(|value| {
                value
                    .as_i64()
                    .ok_or_else(|| self.wrong_type(key, "an integer or null", value))
            })
            .transpose()
    }

    /// A boolean, or the integer flags `0` and `1`. Rule lookups only match
    /// a stored `1`, so any other integer is rejected.
    pub(crate) fn optional_flag(&self, key: &str) -> SeedResult<Option<bool>> {
        self.present(key)
            .map(|value| match value {
                Value::Bool(flag) => Ok(*flag),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(false),
                    Some(1) => Ok(true),
                    _ => Err(self.wrong_type(key, "a boolean or 0/1", value)),
                },
                other => Err(self.wrong_type(key, "a boolean or 0/1", other)),
            })
            .transpose()
    }

    pub(crate) fn optional_side(&self, key: &str) -> SeedResult<Side> {
        match self.optional_str(key)? {
            None => Ok(Side::Any),
            Some(text) if text.trim().is_empty() => Ok(Side::Any),
            Some(text) => text
                .parse()
                .map_err(|e: srm_types::SideParseError| {
                    SeedError::validation(self.path_of(key), e.to_string())
                }),
        }
    }

    /// A JSON object, defaulting to `{}`.
    pub(crate) fn optional_object(&self, key: &str) -> SeedResult<Map<String, Value>> {
        match self.present(key) {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(self.wrong_type(key, "an object", other)),
        }
    }

    /// A required JSON array.
    pub(crate) fn required_array(&self, key: &str) -> SeedResult<&'a Vec<Value>> {
        let value = self.required(key)?;
        value
            .as_array()
            .ok_or_else(|| self.wrong_type(key, "an array", value))
    }
}

/// Check a `conditions` object against the clause vocabulary.
pub(crate) fn check_conditions(conditions: &Map<String, Value>, path: &str) -> SeedResult<()> {
    if let Some(value) = conditions.get("requires_no_visible_crack") {
        if !(value.is_null() || value.is_boolean()) {
            return Err(SeedError::validation(
                format!("{path}.requires_no_visible_crack"),
                format!("must be a boolean or null, got {}", type_name(value)),
            ));
        }
    }

    for list in ["deny_if", "allow_if"] {
        let clauses = match conditions.get(list) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(clauses)) => clauses,
            Some(other) => {
                return Err(SeedError::validation(
                    format!("{path}.{list}"),
                    format!("must be an array, got {}", type_name(other)),
                ))
            }
        };
        for (j, clause) in clauses.iter().enumerate() {
            check_clause(clause, &format!("{path}.{list}[{j}]"))?;
        }
    }
    Ok(())
}

fn check_clause(clause: &Value, path: &str) -> SeedResult<()> {
    let fields = Fields::new(clause, path)?;
    fields.required_str("field")?;
    let op = fields.required("op")?;
    let symbol = op
        .as_str()
        .ok_or_else(|| fields.wrong_type("op", "a string", op))?;
    if CompareOp::from_symbol(symbol).is_none() {
        return Err(SeedError::validation(
            fields.path_of("op"),
            format!("unknown operator '{symbol}', expected one of == != < <= > >="),
        ));
    }
    Ok(())
}

/// Check that every known limit key holds a number.
pub(crate) fn check_limits(limits: &Map<String, Value>, path: &str) -> SeedResult<()> {
    for key in [
        "max_diameter_mm",
        "max_depth_mm",
        "max_depth_to_thickness_ratio",
    ] {
        match limits.get(key) {
            None | Some(Value::Null) | Some(Value::Number(_)) => {}
            Some(other) => {
                return Err(SeedError::validation(
                    format!("{path}.{key}"),
                    format!("must be a number or null, got {}", type_name(other)),
                ))
            }
        }
    }
    Ok(())
}

/// Check the disposition, injecting `ENGINEERING_REVIEW` when absent.
pub(crate) fn normalize_actions(
    mut actions: Map<String, Value>,
    path: &str,
) -> SeedResult<Map<String, Value>> {
    match actions.get("disposition") {
        None => {
            actions.insert(
                "disposition".to_string(),
                Value::String(srm_types::ENGINEERING_REVIEW.to_string()),
            );
        }
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(SeedError::validation(
                format!("{path}.disposition"),
                format!("must be a string, got {}", type_name(other)),
            ))
        }
    }
    Ok(actions)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path_of(err: SeedError) -> String {
        err.path().unwrap_or_default().to_string()
    }

    #[test]
    fn test_required_reports_path() {
        let value = json!({"name": ""});
        let fields = Fields::new(&value, "rule_set").unwrap();
        assert_eq!(path_of(fields.required_str("revision").unwrap_err()), "rule_set.revision");
        assert_eq!(path_of(fields.required_str("name").unwrap_err()), "rule_set.name");
    }

    #[test]
    fn test_numbers_accept_integers_but_integers_reject_floats() {
        let value = json!({"sta_min": 1200, "stringer_min": 2.5, "priority": true});
        let fields = Fields::new(&value, "rules[0]").unwrap();
        assert_eq!(fields.optional_f64("sta_min").unwrap(), Some(1200.0));
        assert!(fields.optional_i64("stringer_min").is_err());
        assert!(fields.optional_i64("priority").is_err());
    }

    #[test]
    fn test_flags_accept_bool_and_int() {
        let value = json!({"a": true, "b": 0, "c": 1, "d": "yes", "e": null});
        let fields = Fields::new(&value, "").unwrap();
        assert_eq!(fields.optional_flag("a").unwrap(), Some(true));
        assert_eq!(fields.optional_flag("b").unwrap(), Some(false));
        assert_eq!(fields.optional_flag("c").unwrap(), Some(true));
        assert_eq!(path_of(fields.optional_flag("d").unwrap_err()), "d");
        assert_eq!(fields.optional_flag("e").unwrap(), None);
    }

    #[test]
    fn test_flags_reject_integers_other_than_zero_and_one() {
        let value = json!({"enabled": 2, "pressurized": -1});
        let fields = Fields::new(&value, "rules[3]").unwrap();
        assert_eq!(path_of(fields.optional_flag("enabled").unwrap_err()), "rules[3].enabled");
        assert_eq!(
            path_of(fields.optional_flag("pressurized").unwrap_err()),
            "rules[3].pressurized"
        );
    }

    #[test]
    fn test_side_defaults_and_rejects_unknown() {
        let value = json!({"side": "lh", "other": "port"});
        let fields = Fields::new(&value, "rules[1]").unwrap();
        assert_eq!(fields.optional_side("side").unwrap(), Side::Lh);
        assert_eq!(fields.optional_side("missing").unwrap(), Side::Any);
        assert_eq!(path_of(fields.optional_side("other").unwrap_err()), "rules[1].other");
    }

    #[test]
    fn test_unknown_operator_names_clause_path() {
        let conditions = json!({"deny_if": [
            {"field": "damage.depth_mm", "op": ">", "value": 1},
            {"field": "damage.depth_mm", "op": "=>", "value": 1}
        ]});
        let err = check_conditions(conditions.as_object().unwrap(), "rules[0].conditions")
            .unwrap_err();
        assert_eq!(path_of(err), "rules[0].conditions.deny_if[1].op");
    }

    #[test]
    fn test_limits_must_be_numeric() {
        let limits = json!({"max_depth_mm": "3", "max_gouge": "ignored"});
        let err = check_limits(limits.as_object().unwrap(), "rules[2].limits").unwrap_err();
        assert_eq!(path_of(err), "rules[2].limits.max_depth_mm");
    }

    #[test]
    fn test_actions_disposition_injected_last() {
        let actions = json!({"next_steps": ["Inspect"]});
        let normalized =
            normalize_actions(actions.as_object().unwrap().clone(), "rules[0].actions").unwrap();
        assert_eq!(
            serde_json::to_string(&normalized).unwrap(),
            r#"{"next_steps":["Inspect"],"disposition":"ENGINEERING_REVIEW"}"#
        );

        let bad = json!({"disposition": 3});
        assert!(normalize_actions(bad.as_object().unwrap().clone(), "x").is_err());
    }
}
