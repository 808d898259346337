//! Rule definitions
//!
//! A rule is keyed by an exact classification (`damage_type`, `structure`,
//! `structure_zone`), narrowed by an applicability envelope, and carries the
//! decision payload as stored JSON text.

use crate::ids::{RuleId, RuleSetId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Aircraft side a rule or a damage location refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "LH", alias = "lh")]
    Lh,
    #[serde(rename = "RH", alias = "rh")]
    Rh,
    #[default]
    #[serde(rename = "ANY", alias = "any")]
    Any,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Lh => "LH",
            Side::Rh => "RH",
            Side::Any => "ANY",
        }
    }

    /// `ANY` on either side of the comparison is a wildcard.
    pub fn admits(&self, other: Side) -> bool {
        matches!(self, Side::Any) || matches!(other, Side::Any) || *self == other
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a side string is not `LH`, `RH` or `ANY`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid side '{0}': expected LH, RH or ANY")]
pub struct SideParseError(pub String);

impl FromStr for Side {
    type Err = SideParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LH" => Ok(Side::Lh),
            "RH" => Ok(Side::Rh),
            "ANY" => Ok(Side::Any),
            _ => Err(SideParseError(s.to_string())),
        }
    }
}

/// A rule that has passed seed validation but has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRule {
    pub enabled: bool,
    pub priority: i64,
    pub damage_type: String,
    pub structure: String,
    pub structure_zone: String,
    pub zone_detail: Option<String>,
    pub side: Side,
    pub sta_min: Option<f64>,
    pub sta_max: Option<f64>,
    pub wl_min: Option<f64>,
    pub wl_max: Option<f64>,
    pub stringer_min: Option<i64>,
    pub stringer_max: Option<i64>,
    pub pressurized: Option<bool>,
    pub material: Option<String>,
    /// Compact JSON text of the `conditions` document
    pub conditions_json: String,
    /// Compact JSON text of the `limits` document
    pub limits_json: String,
    /// Compact JSON text of the `actions` document
    pub actions_json: String,
    pub srm_ref: Option<String>,
    pub severity: String,
    pub notes: Option<String>,
    pub source_page: Option<String>,
}

impl NewRule {
    /// Rule with the seed defaults for everything but its classification.
    pub fn new(
        damage_type: impl Into<String>,
        structure: impl Into<String>,
        structure_zone: impl Into<String>,
    ) -> Self {
        Self {
            enabled: true,
            priority: 0,
            damage_type: damage_type.into(),
            structure: structure.into(),
            structure_zone: structure_zone.into(),
            zone_detail: None,
            side: Side::Any,
            sta_min: None,
            sta_max: None,
            wl_min: None,
            wl_max: None,
            stringer_min: None,
            stringer_max: None,
            pressurized: None,
            material: None,
            conditions_json: "{}".to_string(),
            limits_json: "{}".to_string(),
            actions_json: r#"{"disposition":"ENGINEERING_REVIEW"}"#.to_string(),
            srm_ref: None,
            severity: "engineering".to_string(),
            notes: None,
            source_page: None,
        }
    }

    pub fn into_rule(self, id: RuleId, rule_set_id: RuleSetId) -> Rule {
        Rule {
            id,
            rule_set_id,
            enabled: self.enabled,
            priority: self.priority,
            damage_type: self.damage_type,
            structure: self.structure,
            structure_zone: self.structure_zone,
            zone_detail: self.zone_detail,
            side: self.side,
            sta_min: self.sta_min,
            sta_max: self.sta_max,
            wl_min: self.wl_min,
            wl_max: self.wl_max,
            stringer_min: self.stringer_min,
            stringer_max: self.stringer_max,
            pressurized: self.pressurized,
            material: self.material,
            conditions_json: self.conditions_json,
            limits_json: self.limits_json,
            actions_json: self.actions_json,
            srm_ref: self.srm_ref,
            severity: self.severity,
            notes: self.notes,
            source_page: self.source_page,
        }
    }
}

/// A persisted rule, owned by exactly one rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub rule_set_id: RuleSetId,
    pub enabled: bool,
    /// Higher is evaluated first
    pub priority: i64,
    pub damage_type: String,
    pub structure: String,
    pub structure_zone: String,
    pub zone_detail: Option<String>,
    pub side: Side,
    pub sta_min: Option<f64>,
    pub sta_max: Option<f64>,
    pub wl_min: Option<f64>,
    pub wl_max: Option<f64>,
    pub stringer_min: Option<i64>,
    pub stringer_max: Option<i64>,
    /// Unset matches any pressurization
    pub pressurized: Option<bool>,
    pub material: Option<String>,
    pub conditions_json: String,
    pub limits_json: String,
    pub actions_json: String,
    pub srm_ref: Option<String>,
    pub severity: String,
    pub notes: Option<String>,
    pub source_page: Option<String>,
}
