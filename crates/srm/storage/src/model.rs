use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use srm_types::{AssessmentResult, DamageContext, RuleId};

/// Assessment log append payload. The id is assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssessmentRecord {
    pub created_utc: DateTime<Utc>,
    pub aircraft_family: Option<String>,
    pub aircraft_variant: Option<String>,
    pub zone: Option<String>,
    pub side: Option<String>,
    pub sta: Option<f64>,
    pub wl: Option<f64>,
    pub stringer_num: Option<i64>,
    pub pressurized: Option<bool>,
    pub damage_type: Option<String>,
    pub structure: Option<String>,
    pub diameter_mm: Option<f64>,
    pub depth_mm: Option<f64>,
    pub thickness_mm: Option<f64>,
    pub depth_to_thickness_ratio: Option<f64>,
    pub visible_crack: Option<bool>,
    pub near_fastener_row: Option<bool>,
    pub disposition: String,
    pub severity: String,
    pub rule_id: Option<RuleId>,
    pub srm_ref: Option<String>,
    /// Reasons joined with newlines
    pub reasons: String,
    pub raw_description: Option<String>,
    /// The full context as submitted to the engine
    pub ctx_json: String,
}

impl NewAssessmentRecord {
    /// Capture the raw inputs and the verdict of one evaluation.
    pub fn from_assessment(
        aircraft_family: &str,
        aircraft_variant: Option<&str>,
        ctx: &DamageContext,
        result: &AssessmentResult,
        raw_description: Option<&str>,
        created_utc: DateTime<Utc>,
    ) -> Self {
        let location = &ctx.location;
        let damage = &ctx.damage;
        Self {
            created_utc,
            aircraft_family: Some(aircraft_family.to_string()),
            aircraft_variant: aircraft_variant.map(str::to_string),
            zone: location.zone.clone(),
            side: location.side.map(|s| s.as_str().to_string()),
            sta: location.sta,
            wl: location.wl,
            stringer_num: location.stringer_num,
            pressurized: location.pressurized,
            damage_type: damage.damage_type.clone(),
            structure: damage.structure.clone(),
            diameter_mm: damage.diameter_mm,
            depth_mm: damage.depth_mm,
            thickness_mm: damage.thickness_mm,
            depth_to_thickness_ratio: damage.depth_to_thickness_ratio,
            visible_crack: damage.visible_crack,
            near_fastener_row: damage.near_fastener_row,
            disposition: result.disposition.clone(),
            severity: result.severity.clone(),
            rule_id: result.rule_id,
            srm_ref: result.srm_ref.clone(),
            reasons: result.reasons.join("\n"),
            raw_description: raw_description.map(str::to_string),
            ctx_json: serde_json::to_string(ctx).unwrap_or_default(),
        }
    }

    pub fn with_id(self, id: i64) -> AssessmentRecord {
        AssessmentRecord { id, record: self }
    }
}

/// Persisted assessment log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub id: i64,
    #[serde(flatten)]
    pub record: NewAssessmentRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_captures_inputs_and_verdict() {
        let ctx: DamageContext = serde_json::from_value(json!({
            "location": {"zone": "fuselage", "side": "RH", "sta": 1280},
            "damage": {"type": "dent", "structure": "skin", "diameter_mm": 80.0}
        }))
        .unwrap();
        let mut result = AssessmentResult::no_applicable_rule();
        result.reasons.push("second".to_string());

        let record = NewAssessmentRecord::from_assessment(
            "B787",
            Some("787-9"),
            &ctx,
            &result,
            Some("RH side dent"),
            Utc::now(),
        );

        assert_eq!(record.side.as_deref(), Some("RH"));
        assert_eq!(record.diameter_mm, Some(80.0));
        assert_eq!(record.disposition, "ENGINEERING_REVIEW");
        assert!(record.reasons.ends_with("\nsecond"));
        let ctx_back: DamageContext = serde_json::from_str(&record.ctx_json).unwrap();
        assert_eq!(ctx_back, ctx);
    }
}
