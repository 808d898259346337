//! Typed decision documents carried by a rule
//!
//! Rules persist `conditions`, `limits` and `actions` as JSON text. These are
//! decoded into a closed vocabulary: unknown keys are ignored, known keys
//! must have the documented shape. [`Document::salvage`] decodes an object
//! key by key instead, keeping what is unreadable in a form that fails
//! closed.

use crate::assessment::ENGINEERING_REVIEW;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Which decision document failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Conditions,
    Limits,
    Actions,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::Conditions => "conditions",
            DocumentKind::Limits => "limits",
            DocumentKind::Actions => "actions",
        })
    }
}

/// A stored decision document that is not valid JSON or has the wrong shape
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed {kind} document: {message}")]
pub struct DocumentError {
    pub kind: DocumentKind,
    pub message: String,
}

impl DocumentError {
    pub fn new(kind: DocumentKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A document decoded key by key, with the entries that could not be read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Salvaged<D> {
    pub document: D,
    pub problems: Vec<String>,
}

/// Decoding shared by the three decision documents.
///
/// Blank text and JSON `null` decode to the empty document.
pub trait Document: DeserializeOwned + Default {
    const KIND: DocumentKind;

    /// Decode one object entry by entry. Never fails; entries that do not
    /// have the documented shape are listed in [`Salvaged::problems`].
    fn salvage(map: Map<String, Value>) -> Salvaged<Self>;

    fn decode(raw: &str) -> Result<Self, DocumentError> {
        Self::from_value(parse(Self::KIND, raw)?)
    }

    /// Like [`Document::decode`], but an object is salvaged rather than
    /// rejected. Text that is not a JSON object is still an error.
    fn decode_salvaged(raw: &str) -> Result<Salvaged<Self>, DocumentError> {
        match parse(Self::KIND, raw)? {
            Value::Null => Ok(Salvaged::default()),
            Value::Object(map) => Ok(Self::salvage(map)),
            other => Err(not_an_object(Self::KIND, &other)),
        }
    }

    fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|e| DocumentError::new(Self::KIND, e.to_string())),
            other => Err(not_an_object(Self::KIND, &other)),
        }
    }
}

fn parse(kind: DocumentKind, raw: &str) -> Result<Value, DocumentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).map_err(|e| DocumentError::new(kind, e.to_string()))
}

fn not_an_object(kind: DocumentKind, value: &Value) -> DocumentError {
    DocumentError::new(
        kind,
        format!("expected an object, found {}", json_type_name(value)),
    )
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Comparison operator of a condition clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Gt,
        CompareOp::Ge,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// `{field: "dot.path", op, value}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    pub op: CompareOp,
    #[serde(default)]
    pub value: Value,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// An entry of `deny_if` or `allow_if`.
///
/// `Unreadable` keeps a stored entry whose shape or operator is not
/// understood. It never holds, so it cannot deny a rule and it always fails
/// an `allow_if`. Strict decoding only ever yields `Readable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredClause {
    Readable(Clause),
    Unreadable(Value),
}

impl StoredClause {
    pub fn clause(&self) -> Option<&Clause> {
        match self {
            StoredClause::Readable(clause) => Some(clause),
            StoredClause::Unreadable(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for StoredClause {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Clause::deserialize(deserializer).map(StoredClause::Readable)
    }
}

impl fmt::Display for StoredClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredClause::Readable(clause) => fmt::Display::fmt(clause, f),
            StoredClause::Unreadable(raw) => write!(f, "{raw}"),
        }
    }
}

/// Boolean predicates that decide whether a rule stays eligible
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditions {
    #[serde(deserialize_with = "null_as_default")]
    pub requires_no_visible_crack: bool,
    /// Any true clause rejects the rule
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub deny_if: Vec<StoredClause>,
    /// Every clause must hold
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub allow_if: Vec<StoredClause>,
}

impl Conditions {
    pub fn is_empty(&self) -> bool {
        !self.requires_no_visible_crack && self.deny_if.is_empty() && self.allow_if.is_empty()
    }
}

fn salvage_clauses(list: &str, value: Option<Value>, problems: &mut Vec<String>) -> Vec<StoredClause> {
    let entries = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            problems.push(format!("{list} is {}, not an array", json_type_name(&other)));
            vec![other]
        }
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match serde_json::from_value::<Clause>(entry.clone()) {
            Ok(clause) => StoredClause::Readable(clause),
            Err(e) => {
                problems.push(format!("{list}[{i}]: {e}"));
                StoredClause::Unreadable(entry)
            }
        })
        .collect()
}

impl Document for Conditions {
    const KIND: DocumentKind = DocumentKind::Conditions;

    /// A `requires_no_visible_crack` that is not a boolean is taken as set.
    fn salvage(mut map: Map<String, Value>) -> Salvaged<Self> {
        let mut problems = Vec::new();
        let requires_no_visible_crack = match map.remove("requires_no_visible_crack") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => flag,
            Some(other) => {
                problems.push(format!(
                    "requires_no_visible_crack is {}, not a boolean",
                    json_type_name(&other)
                ));
                true
            }
        };
        let deny_if = salvage_clauses("deny_if", map.remove("deny_if"), &mut problems);
        let allow_if = salvage_clauses("allow_if", map.remove("allow_if"), &mut problems);
        Salvaged {
            document: Self {
                requires_no_visible_crack,
                deny_if,
                allow_if,
            },
            problems,
        }
    }
}

/// Numeric ceilings checked against the damage measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_diameter_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth_to_thickness_ratio: Option<f64>,
    /// Known limit keys whose stored value is not a number. Each one fails
    /// the rule.
    #[serde(skip)]
    pub unreadable: Map<String, Value>,
}

impl Limits {
    pub const KEYS: [&'static str; 3] = [
        "max_diameter_mm",
        "max_depth_mm",
        "max_depth_to_thickness_ratio",
    ];

    pub fn is_empty(&self) -> bool {
        self.max_diameter_mm.is_none()
            && self.max_depth_mm.is_none()
            && self.max_depth_to_thickness_ratio.is_none()
            && self.unreadable.is_empty()
    }
}

/// A stored limit value: a number, or a string holding one.
fn limit_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl Document for Limits {
    const KIND: DocumentKind = DocumentKind::Limits;

    fn salvage(mut map: Map<String, Value>) -> Salvaged<Self> {
        let mut limits = Limits::default();
        let mut problems = Vec::new();
        for key in Self::KEYS {
            let parsed = match map.remove(key) {
                None | Some(Value::Null) => None,
                Some(value) => match limit_value(&value) {
                    Some(limit) => Some(limit),
                    None => {
                        problems.push(format!("{key} is not a number: {value}"));
                        limits.unreadable.insert(key.to_string(), value);
                        None
                    }
                },
            };
            match key {
                "max_diameter_mm" => limits.max_diameter_mm = parsed,
                "max_depth_mm" => limits.max_depth_mm = parsed,
                _ => limits.max_depth_to_thickness_ratio = parsed,
            }
        }
        Salvaged {
            document: limits,
            problems,
        }
    }
}

/// Structured result payload of a rule.
///
/// Always carries a `disposition`; every other key is passed through to the
/// assessment result untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Actions(Map<String, Value>);

impl Actions {
    /// Escalation payload with a single next step.
    pub fn escalation(next_step: &str) -> Self {
        let mut map = Map::new();
        map.insert(
            "disposition".to_string(),
            Value::String(ENGINEERING_REVIEW.to_string()),
        );
        map.insert(
            "next_steps".to_string(),
            Value::Array(vec![Value::String(next_step.to_string())]),
        );
        Self(map)
    }

    /// The `disposition` string, or `ENGINEERING_REVIEW` when it is not a string.
    pub fn disposition(&self) -> &str {
        self.0
            .get("disposition")
            .and_then(Value::as_str)
            .unwrap_or(ENGINEERING_REVIEW)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl Default for Actions {
    fn default() -> Self {
        Self::from(Map::new())
    }
}

impl From<Map<String, Value>> for Actions {
    fn from(mut map: Map<String, Value>) -> Self {
        if !map.contains_key("disposition") {
            map.insert(
                "disposition".to_string(),
                Value::String(ENGINEERING_REVIEW.to_string()),
            );
        }
        Self(map)
    }
}

impl From<Actions> for Map<String, Value> {
    fn from(actions: Actions) -> Self {
        actions.0
    }
}

impl Document for Actions {
    const KIND: DocumentKind = DocumentKind::Actions;

    fn salvage(map: Map<String, Value>) -> Salvaged<Self> {
        Salvaged {
            document: Self::from(map),
            problems: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conditions_ignore_unknown_keys_and_nulls() {
        let conditions = Conditions::decode(
            r#"{"requires_no_visible_crack": true, "deny_if": null, "future_key": 3}"#,
        )
        .unwrap();
        assert!(conditions.requires_no_visible_crack);
        assert!(conditions.deny_if.is_empty());
        assert!(conditions.allow_if.is_empty());
    }

    #[test]
    fn test_clause_parses_operator_vocabulary() {
        let conditions = Conditions::decode(
            r#"{"deny_if": [{"field": "damage.near_fastener_row", "op": "==", "value": true}],
                "allow_if": [{"field": "damage.depth_mm", "op": "<="}]}"#,
        )
        .unwrap();
        assert_eq!(conditions.deny_if[0].clause().map(|c| c.op), Some(CompareOp::Eq));
        assert_eq!(conditions.allow_if[0].clause().map(|c| &c.value), Some(&Value::Null));
        assert_eq!(
            conditions.deny_if[0].to_string(),
            "damage.near_fastener_row == true"
        );
    }

    #[test]
    fn test_unknown_operator_is_malformed() {
        let err = Conditions::decode(r#"{"deny_if": [{"field": "x", "op": "~=", "value": 1}]}"#)
            .unwrap_err();
        assert_eq!(err.kind, DocumentKind::Conditions);
    }

    #[test]
    fn test_blank_and_null_decode_to_empty() {
        assert!(Conditions::decode("").unwrap().is_empty());
        assert!(Limits::decode("null").unwrap().is_empty());
        assert_eq!(Actions::decode("  ").unwrap().disposition(), ENGINEERING_REVIEW);
    }

    #[test]
    fn test_non_object_documents_are_malformed() {
        let err = Limits::decode("[1, 2]").unwrap_err();
        assert!(err.message.contains("array"));
        assert!(Actions::decode("{not json").is_err());
    }

    #[test]
    fn test_limits_reject_non_numeric_values() {
        assert!(Limits::decode(r#"{"max_diameter_mm": "fifty"}"#).is_err());
        let limits = Limits::decode(r#"{"max_diameter_mm": 50, "max_gouge_mm": 2}"#).unwrap();
        assert_eq!(limits.max_diameter_mm, Some(50.0));
    }

    #[test]
    fn test_actions_inject_disposition_and_keep_other_keys() {
        let actions = Actions::decode(r#"{"next_steps": ["inspect"]}"#).unwrap();
        assert_eq!(actions.disposition(), ENGINEERING_REVIEW);
        assert_eq!(actions.get("next_steps"), Some(&json!(["inspect"])));

        let actions = Actions::decode(r#"{"disposition": "ALLOW_AS_IS"}"#).unwrap();
        assert_eq!(actions.disposition(), "ALLOW_AS_IS");
    }

    #[test]
    fn test_non_string_disposition_reads_as_review() {
        let actions = Actions::decode(r#"{"disposition": 5}"#).unwrap();
        assert_eq!(actions.disposition(), ENGINEERING_REVIEW);
    }

    #[test]
    fn test_actions_serialize_as_plain_object() {
        let actions = Actions::escalation("Provide missing details.");
        assert_eq!(
            serde_json::to_value(&actions).unwrap(),
            json!({"disposition": "ENGINEERING_REVIEW", "next_steps": ["Provide missing details."]})
        );
    }

    #[test]
    fn test_salvaged_conditions_keep_unreadable_clauses_in_place() {
        let salvaged = Conditions::decode_salvaged(
            r#"{"requires_no_visible_crack": "yes",
                "deny_if": [{"field": "x", "op": "~=", "value": 1}],
                "allow_if": [
                    {"field": "damage.depth_mm", "op": "<=", "value": 2},
                    {"field": "damage.visible_crack", "op": "=", "value": false}
                ]}"#,
        )
        .unwrap();
        let conditions = salvaged.document;
        assert!(conditions.requires_no_visible_crack);
        assert!(conditions.deny_if[0].clause().is_none());
        assert!(conditions.allow_if[0].clause().is_some());
        assert_eq!(
            conditions.allow_if[1],
            StoredClause::Unreadable(json!({"field": "damage.visible_crack", "op": "=", "value": false}))
        );
        assert_eq!(salvaged.problems.len(), 3);
    }

    #[test]
    fn test_salvaged_clause_list_that_is_not_an_array() {
        let salvaged = Conditions::decode_salvaged(r#"{"allow_if": {"field": "x"}}"#).unwrap();
        assert_eq!(salvaged.document.allow_if.len(), 1);
        assert!(salvaged.document.allow_if[0].clause().is_none());
    }

    #[test]
    fn test_salvaged_limits_keep_readable_keys() {
        let salvaged = Limits::decode_salvaged(
            r#"{"max_diameter_mm": 50, "max_depth_mm": "fifty", "max_depth_to_thickness_ratio": "0.05"}"#,
        )
        .unwrap();
        let limits = salvaged.document;
        assert_eq!(limits.max_diameter_mm, Some(50.0));
        assert_eq!(limits.max_depth_mm, None);
        assert_eq!(limits.max_depth_to_thickness_ratio, Some(0.05));
        assert_eq!(limits.unreadable.get("max_depth_mm"), Some(&json!("fifty")));
        assert!(!limits.is_empty());
        assert_eq!(salvaged.problems, vec!["max_depth_mm is not a number: \"fifty\""]);
    }

    #[test]
    fn test_salvage_still_rejects_text_that_is_not_an_object() {
        assert!(Limits::decode_salvaged("{not json").is_err());
        assert!(Conditions::decode_salvaged("[1]").is_err());
        assert!(Limits::decode_salvaged(" ").unwrap().document.is_empty());
        assert!(Conditions::decode_salvaged("null").unwrap().problems.is_empty());
    }

    #[test]
    fn test_compare_op_symbols_round_trip() {
        for op in CompareOp::ALL {
            assert_eq!(CompareOp::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(CompareOp::from_symbol("=~"), None);
    }
}
