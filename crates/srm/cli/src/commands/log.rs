//! Assessment log commands

use crate::backends::Backends;
use crate::error::CliResult;
use crate::output::{cell, print_output, print_single, print_success, OutputFormat};
use clap::Subcommand;
use serde::Serialize;
use srm_storage::AssessmentRecord;
use std::io;
use std::path::PathBuf;
use tabled::Tabled;

/// Log subcommands
#[derive(Debug, Subcommand)]
pub enum LogCommands {
    /// Show the most recent assessments
    List {
        /// Number of records, newest first
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Export the assessment log as CSV
    Export {
        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Number of records, newest first; 0 exports everything
        #[arg(short, long, default_value_t = 0)]
        limit: usize,
    },
}

/// Table row for assessment display
#[derive(Debug, Serialize, Tabled)]
struct AssessmentRow {
    id: i64,
    created: String,
    family: String,
    side: String,
    sta: String,
    damage: String,
    diameter_mm: String,
    disposition: String,
    rule: String,
}

impl From<&AssessmentRecord> for AssessmentRow {
    fn from(entry: &AssessmentRecord) -> Self {
        let record = &entry.record;
        Self {
            id: entry.id,
            created: record.created_utc.format("%Y-%m-%d %H:%M").to_string(),
            family: cell(record.aircraft_family.as_deref()),
            side: cell(record.side.as_deref()),
            sta: cell(record.sta),
            damage: cell(record.damage_type.as_deref()),
            diameter_mm: cell(record.diameter_mm),
            disposition: record.disposition.clone(),
            rule: cell(record.rule_id),
        }
    }
}

const CSV_HEADER: [&str; 25] = [
    "id",
    "created_utc",
    "aircraft_family",
    "aircraft_variant",
    "zone",
    "side",
    "sta",
    "wl",
    "stringer_num",
    "pressurized",
    "damage_type",
    "structure",
    "diameter_mm",
    "depth_mm",
    "thickness_mm",
    "depth_to_thickness_ratio",
    "visible_crack",
    "near_fastener_row",
    "disposition",
    "severity",
    "rule_id",
    "srm_ref",
    "reasons",
    "raw_description",
    "ctx_json",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn flag(value: Option<bool>) -> String {
    opt(value.map(i64::from))
}

fn csv_row(entry: &AssessmentRecord) -> [String; 25] {
    let r = &entry.record;
    [
        entry.id.to_string(),
        r.created_utc.to_rfc3339(),
        opt(r.aircraft_family.as_deref()),
        opt(r.aircraft_variant.as_deref()),
        opt(r.zone.as_deref()),
        opt(r.side.as_deref()),
        opt(r.sta),
        opt(r.wl),
        opt(r.stringer_num),
        flag(r.pressurized),
        opt(r.damage_type.as_deref()),
        opt(r.structure.as_deref()),
        opt(r.diameter_mm),
        opt(r.depth_mm),
        opt(r.thickness_mm),
        opt(r.depth_to_thickness_ratio),
        flag(r.visible_crack),
        flag(r.near_fastener_row),
        r.disposition.clone(),
        r.severity.clone(),
        opt(r.rule_id.map(|id| id.get())),
        opt(r.srm_ref.as_deref()),
        r.reasons.clone(),
        opt(r.raw_description.as_deref()),
        r.ctx_json.clone(),
    ]
}

/// Write records as CSV. Columns follow the assessment log schema.
pub fn write_csv<W: io::Write>(records: &[AssessmentRecord], writer: W) -> CliResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for entry in records {
        csv.write_record(csv_row(entry))?;
    }
    csv.flush()?;
    Ok(())
}

/// Execute a log command
pub async fn execute(command: LogCommands, backends: &Backends, format: OutputFormat) -> CliResult<()> {
    match command {
        LogCommands::List { limit } => {
            let records = backends.log.recent_assessments(limit).await?;
            if format == OutputFormat::Table {
                print_output(records.iter().map(AssessmentRow::from).collect(), format)
            } else {
                print_single(&records, format)
            }
        }

        LogCommands::Export { out, limit } => {
            let records = backends.log.recent_assessments(limit).await?;
            let file = std::fs::File::create(&out)?;
            write_csv(&records, file)?;
            print_success(&format!(
                "Exported {} assessments to {}",
                records.len(),
                out.display()
            ));
            Ok(())
        }
    }
}
