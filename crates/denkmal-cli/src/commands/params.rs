use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use denkmal_core::params::derive::{
    municipal_grant_from_funding, requested_loan_base, MUNICIPAL_GRANT_FACTOR,
};
use denkmal_core::params::{apply_edit, normalize_percentages, subsidized_loan_limit, FieldEdit};
use denkmal_core::params::ProjectionInput;

use crate::input;

/// Arguments for percent normalization
#[derive(Args)]
pub struct NormalizeArgs {
    /// Path to a JSON or YAML parameter file (stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the subsidized-loan limit
#[derive(Args)]
pub struct LoanLimitArgs {
    /// Number of residential units
    #[arg(long)]
    pub units: u32,

    /// Fundable costs; the loan base follows them up to the limit
    #[arg(long)]
    pub fundable_costs: Option<Decimal>,
}

/// Arguments for the municipal cash grant
#[derive(Args)]
pub struct MunicipalGrantArgs {
    /// Municipal funding amount
    #[arg(long)]
    pub funding: Decimal,
}

pub fn run_normalize(args: NormalizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = input::load_value(args.input.as_deref())?;
    let map = value
        .as_object()
        .ok_or("parameter record must be a JSON/YAML object")?;
    Ok(json!({ "result": normalize_percentages(map) }))
}

pub fn run_loan_limit(args: LoanLimitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut record = apply_edit(&ProjectionInput::default(), FieldEdit::UnitCount(args.units));
    if let Some(costs) = args.fundable_costs {
        record = apply_edit(&record, FieldEdit::FundableCosts(costs));
    }

    Ok(json!({
        "result": {
            "units": args.units,
            "limit": subsidized_loan_limit(args.units),
            "fundable_costs": record.fundable_costs,
            "requested_base": requested_loan_base(record.fundable_costs, record.subsidized_loan_base),
            "subsidized_loan_base": record.subsidized_loan_base,
        }
    }))
}

pub fn run_municipal_grant(args: MunicipalGrantArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.funding < Decimal::ZERO {
        return Err("funding amount must not be negative".into());
    }
    Ok(json!({
        "result": {
            "funding": args.funding,
            "grant_factor": MUNICIPAL_GRANT_FACTOR,
            "municipal_grant": municipal_grant_from_funding(args.funding),
        }
    }))
}
