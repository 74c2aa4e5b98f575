use chrono::Datelike;
use clap::Args;
use serde_json::Value;

use denkmal_core::params::ProjectionInput;
use denkmal_core::projection::{run_depreciation, run_financing, run_investment, run_projection};

use crate::input;

/// Arguments for the full projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to a JSON or YAML parameter file (stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Override the holding period in years
    #[arg(long)]
    pub holding_years: Option<u32>,

    /// Override the projection horizon (30 or 35 years)
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Print only the yearly table instead of the full envelope
    #[arg(long)]
    pub years_only: bool,
}

/// Arguments shared by the single-stage commands
#[derive(Args)]
pub struct StageArgs {
    /// Path to a JSON or YAML parameter file (stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// The current calendar year + 1.
fn latest_tax_year() -> i32 {
    chrono::Local::now().year() + 1
}

/// Load the record and apply the calendar-dependent tax-year bound.
fn load_record(path: Option<&str>) -> Result<ProjectionInput, Box<dyn std::error::Error>> {
    let record: ProjectionInput = input::load(path)?;
    record.validate_tax_year(latest_tax_year())?;
    Ok(record)
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut record = load_record(args.input.as_deref())?;
    if let Some(years) = args.holding_years {
        record.holding_period_years = years;
    }
    if let Some(horizon) = args.horizon {
        record.horizon_years = horizon.try_into()?;
    }

    let result = run_projection(&record)?;
    if args.years_only {
        return Ok(serde_json::to_value(&result.result.years)?);
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_investment_stage(args: StageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(args.input.as_deref())?;
    let result = run_investment(&record)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_financing_stage(args: StageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(args.input.as_deref())?;
    let result = run_financing(&record)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_depreciation_stage(args: StageArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let record = load_record(args.input.as_deref())?;
    let result = run_depreciation(&record)?;
    Ok(serde_json::to_value(result)?)
}
