//! Free-text description parsing

use crate::error::CliResult;
use crate::intake::parse_damage_description;
use crate::output::{print_info, print_single, OutputFormat};
use clap::Args;

/// Arguments for `srm parse`
#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Damage description, e.g. "B787, fuselage, LH side, STA 1280, skin dent 25mm dia"
    pub text: String,
}

/// Execute `srm parse`
pub fn execute(args: ParseArgs, format: OutputFormat) -> CliResult<()> {
    let parsed = parse_damage_description(&args.text)?;
    if parsed.is_empty() && format == OutputFormat::Table {
        print_info("No fields recognised");
        return Ok(());
    }
    print_single(&parsed, format)
}
