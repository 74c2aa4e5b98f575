mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::params::{LoanLimitArgs, MunicipalGrantArgs, NormalizeArgs};
use commands::projection::{ProjectArgs, StageArgs};

/// Listed-building investment and tax-depreciation projections
#[derive(Parser)]
#[command(
    name = "dkr",
    version,
    about = "Listed-building investment and tax-depreciation projections",
    long_about = "Projects acquisition costs, subsidized financing, special depreciation, \
                  after-tax cash flow and returns for a listed-building renovation. \
                  Reads a JSON or YAML parameter record from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full 30/35-year projection with KPIs
    Project(ProjectArgs),
    /// Acquisition costs, depreciation bases and financing split
    Investment(StageArgs),
    /// Bank and subsidized loan schedules
    Financing(StageArgs),
    /// Special and straight-line depreciation schedule
    Depreciation(StageArgs),
    /// Convert every `*_pct` field of a record to a fraction
    Normalize(NormalizeArgs),
    /// Subsidized-loan limit for a number of units
    LoanLimit(LoanLimitArgs),
    /// Municipal cash grant on a funding amount
    MunicipalGrant(MunicipalGrantArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Investment(args) => commands::projection::run_investment_stage(args),
        Commands::Financing(args) => commands::projection::run_financing_stage(args),
        Commands::Depreciation(args) => commands::projection::run_depreciation_stage(args),
        Commands::Normalize(args) => commands::params::run_normalize(args),
        Commands::LoanLimit(args) => commands::params::run_loan_limit(args),
        Commands::MunicipalGrant(args) => commands::params::run_municipal_grant(args),
        Commands::Version => {
            println!("dkr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
