//! Output formatting utilities

use crate::error::CliResult;
use colored::*;
use serde::Serialize;
use srm_types::{AssessmentResult, Outcome};
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Print a vector of items in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&data)?),
    }
    Ok(())
}

/// Print a single item in the specified format
pub fn print_single<T: Serialize>(data: &T, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?)
        }
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(data)?),
    }
    Ok(())
}

/// Print an assessment verdict. Table format renders a readable summary;
/// JSON and YAML emit the result as-is.
pub fn print_assessment(result: &AssessmentResult, format: OutputFormat) -> CliResult<()> {
    if format != OutputFormat::Table {
        return print_single(result, format);
    }

    let disposition = match result.outcome {
        Outcome::Pass => result.disposition.green().bold(),
        Outcome::Fail => result.disposition.red().bold(),
        _ => result.disposition.yellow().bold(),
    };
    println!("{} {}", "Disposition:".bold(), disposition);
    println!("  Outcome:  {}", result.outcome);
    println!("  Passed:   {}", result.passed);
    println!("  Severity: {}", result.severity);
    println!(
        "  Rule:     {}",
        result
            .rule_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("  SRM ref:  {}", result.srm_ref.as_deref().unwrap_or("-"));

    println!("{}", "Reasons:".bold());
    for reason in &result.reasons {
        println!("  - {reason}");
    }

    if let Some(steps) = result.actions.get("next_steps").and_then(|v| v.as_array()) {
        println!("{}", "Next steps:".bold());
        for step in steps {
            match step.as_str() {
                Some(text) => println!("  - {text}"),
                None => println!("  - {step}"),
            }
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Render an optional cell for table rows
pub fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert!(matches!(format, OutputFormat::Table));
    }

    #[test]
    fn test_cell() {
        assert_eq!(cell(Some(1280.5)), "1280.5");
        assert_eq!(cell(None::<i64>), "-");
    }
}
