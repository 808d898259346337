//! Damage context submitted for assessment

use crate::rule::Side;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where the damage is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub zone: Option<String>,
    pub side: Option<Side>,
    pub sta: Option<f64>,
    pub wl: Option<f64>,
    pub stringer_num: Option<i64>,
    pub pressurized: Option<bool>,
}

/// What the damage is and how large
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Damage {
    #[serde(rename = "type")]
    pub damage_type: Option<String>,
    pub structure: Option<String>,
    pub diameter_mm: Option<f64>,
    pub depth_mm: Option<f64>,
    pub thickness_mm: Option<f64>,
    pub depth_to_thickness_ratio: Option<f64>,
    pub visible_crack: Option<bool>,
    pub near_fastener_row: Option<bool>,
}

/// Normalized damage report. Built per request and never mutated by the
/// engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageContext {
    pub location: Location,
    pub damage: Damage,
}

impl DamageContext {
    /// Fill `depth_to_thickness_ratio` from depth and a positive thickness
    /// when it is not already set.
    pub fn with_derived_ratio(mut self) -> Self {
        if self.damage.depth_to_thickness_ratio.is_none() {
            if let (Some(depth), Some(thickness)) = (self.damage.depth_mm, self.damage.thickness_mm)
            {
                if thickness > 0.0 {
                    self.damage.depth_to_thickness_ratio = Some(depth / thickness);
                }
            }
        }
        self
    }

    /// JSON view of the context, used for dotted-path clause lookups.
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Walk a dotted path through a JSON document.
///
/// Missing keys, non-object intermediate nodes and `null` leaves all resolve
/// to `None`.
pub fn resolve_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> DamageContext {
        serde_json::from_value(json!({
            "location": {"zone": "fuselage", "side": "LH", "sta": 1280, "pressurized": true},
            "damage": {"type": "dent", "structure": "skin", "diameter_mm": 25.0, "depth_mm": 0.3, "thickness_mm": 2.0}
        }))
        .unwrap()
    }

    #[test]
    fn test_context_deserializes_partial_input() {
        let ctx: DamageContext = serde_json::from_value(json!({"damage": {"type": "dent"}})).unwrap();
        assert_eq!(ctx.damage.damage_type.as_deref(), Some("dent"));
        assert_eq!(ctx.location, Location::default());
    }

    #[test]
    fn test_resolve_path_walks_nested_keys() {
        let doc = context().to_document();
        assert_eq!(resolve_path(&doc, "damage.type"), Some(&json!("dent")));
        assert_eq!(resolve_path(&doc, "location.sta"), Some(&json!(1280.0)));
    }

    #[test]
    fn test_resolve_path_missing_is_none() {
        let doc = context().to_document();
        assert_eq!(resolve_path(&doc, "location.wl"), None);
        assert_eq!(resolve_path(&doc, "damage.type.inner"), None);
        assert_eq!(resolve_path(&doc, "nowhere.at.all"), None);
        assert_eq!(resolve_path(&doc, ""), None);
    }

    #[test]
    fn test_derived_ratio() {
        let ctx = context().with_derived_ratio();
        let ratio = ctx.damage.depth_to_thickness_ratio.unwrap();
        assert!((ratio - 0.15).abs() < 1e-9);

        let mut zero = context();
        zero.damage.thickness_mm = Some(0.0);
        assert_eq!(zero.with_derived_ratio().damage.depth_to_thickness_ratio, None);
    }

    #[test]
    fn test_derived_ratio_keeps_explicit_value() {
        let mut ctx = context();
        ctx.damage.depth_to_thickness_ratio = Some(0.01);
        assert_eq!(ctx.with_derived_ratio().damage.depth_to_thickness_ratio, Some(0.01));
    }
}
