//! Rule set listing

use crate::backends::Backends;
use crate::error::CliResult;
use crate::output::{cell, print_output, print_single, OutputFormat};
use clap::Args;
use serde::Serialize;
use srm_types::RuleSet;
use tabled::Tabled;

/// Arguments for `srm rule-sets`
#[derive(Debug, Args)]
pub struct RuleSetArgs {
    /// Only list rule sets for this aircraft family
    #[arg(long)]
    pub family: Option<String>,
}

/// Table row for rule set display
#[derive(Debug, Serialize, Tabled)]
struct RuleSetRow {
    id: i64,
    family: String,
    revision: String,
    name: String,
    effective: String,
    source: String,
}

impl From<RuleSet> for RuleSetRow {
    fn from(rule_set: RuleSet) -> Self {
        Self {
            id: rule_set.id.get(),
            family: rule_set.aircraft_family,
            revision: rule_set.revision,
            name: rule_set.name,
            effective: cell(rule_set.effective_date),
            source: cell(rule_set.source),
        }
    }
}

/// Execute `srm rule-sets`
pub async fn execute(args: RuleSetArgs, backends: &Backends, format: OutputFormat) -> CliResult<()> {
    let rule_sets = backends.rules.list_rule_sets(args.family.as_deref()).await?;
    if format == OutputFormat::Table {
        print_output(rule_sets.into_iter().map(RuleSetRow::from).collect(), format)
    } else {
        print_single(&rule_sets, format)
    }
}
