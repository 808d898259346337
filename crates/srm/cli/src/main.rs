//! SRM CLI - Structural Repair Manual advisor for fuselage damage
//!
//! This CLI gives inspectors and engineers a terminal interface to:
//! - Seed versioned SRM rule sets from JSON or YAML documents
//! - Assess a dent against the allowable damage limits
//! - Extract fields from a free-text damage description
//! - Browse and export the assessment log

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod backends;
mod commands;
mod config;
mod error;
mod intake;
mod output;

use backends::Backends;
use commands::{assess, log, parse, rule_sets, seed};
use config::CliConfig;
use error::CliResult;

/// SRM CLI application
#[derive(Parser)]
#[command(name = "srm")]
#[command(about = "SRM advisor - fuselage damage assessment against SRM limits", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SRM_CONFIG")]
    config: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Rule database (path or sqlite: URL)
    #[arg(long, env = "SRM_RULES_DB")]
    rules_db: Option<String>,

    /// Assessment log database (path or sqlite: URL)
    #[arg(long, env = "SRM_ASSESSMENTS_DB")]
    assessments_db: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Load a rule set seed document
    Seed(seed::SeedArgs),

    /// Assess damage against the rule set for an aircraft family
    Assess(Box<assess::AssessArgs>),

    /// Extract damage fields from a free-text description
    Parse(parse::ParseArgs),

    /// List stored rule sets
    RuleSets(rule_sets::RuleSetArgs),

    /// Assessment log
    Log {
        #[command(subcommand)]
        command: log::LogCommands,
    },

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Load config
    let mut config = CliConfig::load(cli.config.as_deref())?;
    config.storage = config
        .storage
        .with_overrides(cli.rules_db.as_deref(), cli.assessments_db.as_deref());

    // Initialize tracing
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into());
    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    match cli.command {
        Commands::Parse(args) => parse::execute(args, cli.output),
        Commands::Config => output::print_single(&config, output::OutputFormat::Yaml),
        command => {
            let backends = Backends::open(&config.storage).await?;
            match command {
                Commands::Seed(args) => seed::execute(args, &backends, cli.output).await,
                Commands::Assess(args) => {
                    assess::execute(*args, &backends, &config, cli.output).await
                }
                Commands::RuleSets(args) => rule_sets::execute(args, &backends, cli.output).await,
                Commands::Log { command } => log::execute(command, &backends, cli.output).await,
                Commands::Parse(_) | Commands::Config => Ok(()),
            }
        }
    }
}
