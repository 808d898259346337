//! Damage assessment

use super::read_document;
use super::seed::load_file;
use crate::backends::Backends;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::intake::{DescriptionParser, ParsedDescription};
use crate::output::{print_assessment, print_warning, OutputFormat};
use chrono::Utc;
use clap::Args;
use srm_engine::Advisor;
use srm_storage::NewAssessmentRecord;
use srm_types::{AssessmentResult, DamageContext, LoadMode, Side, SideParseError};
use std::path::PathBuf;
use tracing::debug;

/// Arguments for `srm assess`
///
/// The context is built in layers: `--context` file, then `--describe`
/// text, then the individual flags.
#[derive(Debug, Default, Args)]
pub struct AssessArgs {
    /// Aircraft family (defaults to the parsed description, then config)
    #[arg(long)]
    pub family: Option<String>,

    /// Rule set revision; latest when omitted
    #[arg(long)]
    pub revision: Option<String>,

    /// Aircraft variant, recorded in the assessment log
    #[arg(long)]
    pub variant: Option<String>,

    /// Damage context document (JSON or YAML)
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Free-text damage description
    #[arg(long)]
    pub describe: Option<String>,

    /// Seed document loaded (upsert with wipe) before assessing
    #[arg(long)]
    pub seed: Option<PathBuf>,

    #[arg(long)]
    pub zone: Option<String>,

    /// LH, RH or ANY
    #[arg(long, value_parser = parse_side)]
    pub side: Option<Side>,

    #[arg(long)]
    pub sta: Option<f64>,

    #[arg(long)]
    pub wl: Option<f64>,

    #[arg(long)]
    pub stringer: Option<i64>,

    #[arg(long)]
    pub pressurized: Option<bool>,

    /// Damage type, e.g. dent
    #[arg(long = "type")]
    pub damage_type: Option<String>,

    /// Damaged structure, e.g. skin
    #[arg(long)]
    pub structure: Option<String>,

    #[arg(long)]
    pub diameter: Option<f64>,

    #[arg(long)]
    pub depth: Option<f64>,

    /// Skin thickness; with `--depth` it yields the depth/thickness ratio
    #[arg(long)]
    pub thickness: Option<f64>,

    #[arg(long)]
    pub ratio: Option<f64>,

    #[arg(long)]
    pub visible_crack: Option<bool>,

    #[arg(long)]
    pub near_fastener_row: Option<bool>,

    /// Do not record the assessment
    #[arg(long)]
    pub no_log: bool,
}

fn parse_side(value: &str) -> Result<Side, SideParseError> {
    value.parse()
}

impl AssessArgs {
    /// Apply the location and damage flags over `ctx`.
    fn apply_flags(&self, ctx: &mut DamageContext) {
        let location = &mut ctx.location;
        if let Some(zone) = &self.zone {
            location.zone = Some(zone.clone());
        }
        location.side = self.side.or(location.side);
        location.sta = self.sta.or(location.sta);
        location.wl = self.wl.or(location.wl);
        location.stringer_num = self.stringer.or(location.stringer_num);
        location.pressurized = self.pressurized.or(location.pressurized);

        let damage = &mut ctx.damage;
        if let Some(damage_type) = &self.damage_type {
            damage.damage_type = Some(damage_type.clone());
        }
        if let Some(structure) = &self.structure {
            damage.structure = Some(structure.clone());
        }
        damage.diameter_mm = self.diameter.or(damage.diameter_mm);
        damage.depth_mm = self.depth.or(damage.depth_mm);
        damage.thickness_mm = self.thickness.or(damage.thickness_mm);
        damage.depth_to_thickness_ratio = self.ratio.or(damage.depth_to_thickness_ratio);
        damage.visible_crack = self.visible_crack.or(damage.visible_crack);
        damage.near_fastener_row = self.near_fastener_row.or(damage.near_fastener_row);
    }

    /// Build the damage context and the parsed description, if any.
    pub fn build_context(&self) -> CliResult<(DamageContext, Option<ParsedDescription>)> {
        let mut ctx: DamageContext = match &self.context {
            Some(path) => serde_json::from_value(read_document(path)?)?,
            None => DamageContext::default(),
        };

        let parsed = match &self.describe {
            Some(text) => {
                let parsed = DescriptionParser::new()?.parse(text);
                parsed.apply_to(&mut ctx);
                Some(parsed)
            }
            None => None,
        };

        self.apply_flags(&mut ctx);
        Ok((ctx.with_derived_ratio(), parsed))
    }
}

/// Evaluate the assessment described by `args` and log it unless asked not to.
pub async fn run(
    args: &AssessArgs,
    backends: &Backends,
    config: &CliConfig,
) -> CliResult<AssessmentResult> {
    if let Some(seed) = &args.seed {
        load_file(seed, LoadMode::Upsert { wipe: true }, backends).await?;
    }

    let (ctx, parsed) = args.build_context()?;
    let parsed = parsed.unwrap_or_default();

    let family = args
        .family
        .clone()
        .or(parsed.aircraft_family)
        .unwrap_or_else(|| config.defaults.aircraft_family.clone());
    let revision = args.revision.as_deref().or(config.defaults.revision.as_deref());
    let variant = args.variant.as_deref().or(parsed.aircraft_variant.as_deref());
    debug!(family = %family, revision = ?revision, "Assessing damage");

    let advisor =
        Advisor::new(backends.rules.clone()).with_policy(config.engine.stored_documents);
    let result = advisor.evaluate(&family, &ctx, revision).await;

    if !args.no_log {
        let record = NewAssessmentRecord::from_assessment(
            &family,
            variant,
            &ctx,
            &result,
            args.describe.as_deref(),
            Utc::now(),
        );
        if let Err(e) = backends.log.append_assessment(record).await {
            print_warning(&format!("Assessment not logged: {e}"));
        }
    }

    Ok(result)
}

/// Execute `srm assess`
pub async fn execute(
    args: AssessArgs,
    backends: &Backends,
    config: &CliConfig,
    format: OutputFormat,
) -> CliResult<()> {
    let result = run(&args, backends, config).await?;
    print_assessment(&result, format)
}
