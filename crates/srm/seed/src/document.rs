use crate::validate::{check_conditions, check_limits, normalize_actions, type_name, Fields};
use crate::{SeedError, SeedResult};
use serde_json::{Map, Value};
use srm_types::{NewRule, NewRuleSet};

/// A validated seed document.
///
/// Construction is the validation step: every rule carries its typed
/// defaults and its decision documents as compact JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedDocument {
    pub rule_set: NewRuleSet,
    pub rules: Vec<NewRule>,
}

impl SeedDocument {
    /// Parse and validate JSON text.
    pub fn from_json_str(text: &str) -> SeedResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SeedError::validation("document", format!("invalid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Validate an already parsed document.
    pub fn from_value(value: &Value) -> SeedResult<Self> {
        if !value.is_object() {
            return Err(SeedError::validation(
                "document",
                format!("must be an object, got {}", type_name(value)),
            ));
        }
        let root = Fields::new(value, "")?;
        let rule_set = parse_rule_set(&root)?;

        let rules = root
            .required_array("rules")?
            .iter()
            .enumerate()
            .map(|(i, rule)| parse_rule(rule, &format!("rules[{i}]")))
            .collect::<SeedResult<Vec<_>>>()?;

        Ok(Self { rule_set, rules })
    }
}

impl TryFrom<&Value> for SeedDocument {
    type Error = SeedError;

    fn try_from(value: &Value) -> SeedResult<Self> {
        Self::from_value(value)
    }
}

fn parse_rule_set(root: &Fields<'_>) -> SeedResult<NewRuleSet> {
    let value = root.required("rule_set")?;
    let fields = Fields::new(value, "rule_set")?;
    Ok(NewRuleSet {
        name: fields.required_str("name")?,
        aircraft_family: fields.required_str("aircraft_family")?,
        revision: fields.required_str("revision")?,
        effective_date: fields.optional_str("effective_date")?,
        source: fields.optional_str("source")?,
    })
}

fn parse_rule(value: &Value, path: &str) -> SeedResult<NewRule> {
    let fields = Fields::new(value, path)?;

    let mut rule = NewRule::new(
        fields.required_str("damage_type")?,
        fields.required_str("structure")?,
        fields.required_str("structure_zone")?,
    );

    if let Some(enabled) = fields.optional_flag("enabled")? {
        rule.enabled = enabled;
    }
    if let Some(priority) = fields.optional_i64("priority")? {
        rule.priority = priority;
    }
    rule.zone_detail = fields.optional_str("zone_detail")?;
    rule.side = fields.optional_side("side")?;
    rule.sta_min = fields.optional_f64("sta_min")?;
    rule.sta_max = fields.optional_f64("sta_max")?;
    rule.wl_min = fields.optional_f64("wl_min")?;
    rule.wl_max = fields.optional_f64("wl_max")?;
    rule.stringer_min = fields.optional_i64("stringer_min")?;
    rule.stringer_max = fields.optional_i64("stringer_max")?;
    rule.pressurized = fields.optional_flag("pressurized")?;
    rule.material = fields.optional_str("material")?;

    let conditions = fields.optional_object("conditions")?;
    check_conditions(&conditions, &fields.path_of("conditions"))?;
    let limits = fields.optional_object("limits")?;
    check_limits(&limits, &fields.path_of("limits"))?;
    let actions = normalize_actions(
        fields.optional_object("actions")?,
        &fields.path_of("actions"),
    )?;

    rule.conditions_json = compact(conditions);
    rule.limits_json = compact(limits);
    rule.actions_json = compact(actions);

    rule.srm_ref = fields.optional_str("srm_ref")?;
    if let Some(severity) = fields.optional_str("severity")? {
        if !severity.is_empty() {
            rule.severity = severity;
        }
    }
    rule.notes = fields.optional_str("notes")?;
    rule.source_page = fields.optional_str("source_page")?;

    Ok(rule)
}

fn compact(map: Map<String, Value>) -> String {
    Value::Object(map).to_string()
}
