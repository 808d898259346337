//! Free-text damage description intake.
//!
//! Pulls the fields an inspector usually writes into an AOG message
//! ("B787, fuselage, LH side, STA 1280, S-10L, skin dent 25mm dia, 3mm depth,
//! no visible crack") into a partial damage context. Anything not recognised
//! is left unset.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use srm_types::{DamageContext, Side};

/// Fields recognised in a description
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aircraft_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aircraft_variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stringer_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth_mm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_crack: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<String>,
}

impl ParsedDescription {
    /// Overwrite the context fields this description recognised.
    pub fn apply_to(&self, ctx: &mut DamageContext) {
        let location = &mut ctx.location;
        let damage = &mut ctx.damage;

        if let Some(zone) = &self.zone {
            location.zone = Some(zone.clone());
        }
        if self.side.is_some() {
            location.side = self.side;
        }
        location.sta = self.sta.or(location.sta);
        location.wl = self.wl.or(location.wl);
        location.stringer_num = self.stringer_num.or(location.stringer_num);

        if let Some(damage_type) = &self.damage_type {
            damage.damage_type = Some(damage_type.clone());
        }
        if let Some(structure) = &self.structure {
            damage.structure = Some(structure.clone());
        }
        damage.diameter_mm = self.diameter_mm.or(damage.diameter_mm);
        damage.depth_mm = self.depth_mm.or(damage.depth_mm);
        damage.visible_crack = self.visible_crack.or(damage.visible_crack);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Compiled description patterns
#[derive(Debug, Clone)]
pub struct DescriptionParser {
    family: Regex,
    fuselage: Regex,
    left: Regex,
    right: Regex,
    sta: Regex,
    wl: Regex,
    stringer: Regex,
    diameter: Regex,
    depth: Regex,
    no_crack: Regex,
    crack: Regex,
    dent: Regex,
    skin: Regex,
}

fn pattern(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}

impl DescriptionParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            family: pattern(r"\b(B?\s*7\s*8\s*7(?:-\s*\d+)?)\b")?,
            fuselage: pattern(r"\bfuselage\b")?,
            left: pattern(r"\bLH\b|\bleft\b")?,
            right: pattern(r"\bRH\b|\bright\b")?,
            sta: pattern(r"\bSTA\s*(\d+)\b")?,
            wl: pattern(r"\bWL\s*(\d+)\b")?,
            stringer: pattern(r"\bS[- ]?(\d+)")?,
            diameter: pattern(r"(\d+(?:\.\d+)?)\s*mm\s*(?:dia|diam|diameter)\b")?,
            depth: pattern(r"(\d+(?:\.\d+)?)\s*mm\s*depth\b")?,
            no_crack: pattern(r"\bno\s+visible\s+crack\b|\bno\s+crack\b")?,
            crack: pattern(r"\bvisible\s+crack\b|\bcrack\s+present\b")?,
            dent: pattern(r"\bdent\b")?,
            skin: pattern(r"\bskin\b")?,
        })
    }

    pub fn parse(&self, text: &str) -> ParsedDescription {
        let text = text.trim();
        let mut out = ParsedDescription::default();

        if let Some(found) = capture(&self.family, text) {
            let compact: String = found
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_uppercase();
            out.aircraft_family = Some("B787".to_string());
            out.aircraft_variant = Some(compact.replace('B', ""));
        }

        if self.fuselage.is_match(text) {
            out.zone = Some("fuselage".to_string());
        }

        out.side = if self.left.is_match(text) {
            Some(Side::Lh)
        } else if self.right.is_match(text) {
            Some(Side::Rh)
        } else {
            None
        };

        out.sta = capture(&self.sta, text).and_then(|s| s.parse().ok());
        out.wl = capture(&self.wl, text).and_then(|s| s.parse().ok());
        out.stringer_num = capture(&self.stringer, text).and_then(|s| s.parse().ok());
        out.diameter_mm = capture(&self.diameter, text).and_then(|s| s.parse().ok());
        out.depth_mm = capture(&self.depth, text).and_then(|s| s.parse().ok());

        out.visible_crack = if self.no_crack.is_match(text) {
            Some(false)
        } else if self.crack.is_match(text) {
            Some(true)
        } else {
            None
        };

        if self.dent.is_match(text) {
            out.damage_type = Some("dent".to_string());
        }
        if self.skin.is_match(text) {
            out.structure = Some("skin".to_string());
        }

        out
    }
}

fn capture<'t>(regex: &Regex, text: &'t str) -> Option<&'t str> {
    regex
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// One-shot parse with freshly compiled patterns.
pub fn parse_damage_description(text: &str) -> Result<ParsedDescription, regex::Error> {
    Ok(DescriptionParser::new()?.parse(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AOG: &str =
        "B787, fuselage, LH side, STA 1280, S-10L, skin dent 25mm dia, 3mm depth, no visible crack.";

    #[test]
    fn test_parse_full_description() {
        let parsed = parse_damage_description(AOG).unwrap();
        assert_eq!(parsed.aircraft_family.as_deref(), Some("B787"));
        assert_eq!(parsed.aircraft_variant.as_deref(), Some("787"));
        assert_eq!(parsed.zone.as_deref(), Some("fuselage"));
        assert_eq!(parsed.side, Some(Side::Lh));
        assert_eq!(parsed.sta, Some(1280.0));
        assert_eq!(parsed.wl, None);
        assert_eq!(parsed.stringer_num, Some(10));
        assert_eq!(parsed.diameter_mm, Some(25.0));
        assert_eq!(parsed.depth_mm, Some(3.0));
        assert_eq!(parsed.visible_crack, Some(false));
        assert_eq!(parsed.damage_type.as_deref(), Some("dent"));
        assert_eq!(parsed.structure.as_deref(), Some("skin"));
    }

    #[test]
    fn test_variant_and_right_side() {
        let parsed = parse_damage_description("787-9 right hand skin, WL 200, crack present").unwrap();
        assert_eq!(parsed.aircraft_variant.as_deref(), Some("787-9"));
        assert_eq!(parsed.side, Some(Side::Rh));
        assert_eq!(parsed.wl, Some(200.0));
        assert_eq!(parsed.visible_crack, Some(true));
        assert_eq!(parsed.damage_type, None);
    }

    #[test]
    fn test_unrecognised_text_is_empty() {
        let parsed = parse_damage_description("scratch on the radome").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_decimal_measurements() {
        let parsed = parse_damage_description("dent 12.5 mm diameter, 0.4mm depth").unwrap();
        assert_eq!(parsed.diameter_mm, Some(12.5));
        assert_eq!(parsed.depth_mm, Some(0.4));
    }

    #[test]
    fn test_apply_overwrites_only_recognised_fields() {
        let mut ctx = DamageContext::default();
        ctx.location.pressurized = Some(true);
        ctx.location.side = Some(Side::Rh);
        ctx.damage.thickness_mm = Some(1.6);

        parse_damage_description(AOG).unwrap().apply_to(&mut ctx);

        assert_eq!(ctx.location.side, Some(Side::Lh));
        assert_eq!(ctx.location.pressurized, Some(true));
        assert_eq!(ctx.damage.thickness_mm, Some(1.6));
        assert_eq!(ctx.damage.diameter_mm, Some(25.0));
        assert_eq!(ctx.damage.damage_type.as_deref(), Some("dent"));
    }
}
