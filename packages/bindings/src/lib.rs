use chrono::Datelike;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use std::str::FromStr;

use denkmal_core::params::{FieldEdit, ProjectionInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_input(input_json: &str) -> NapiResult<ProjectionInput> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

/// Parse a record for a calculation; the tax year may reach the current year + 1.
fn parse_checked_input(input_json: &str) -> NapiResult<ProjectionInput> {
    let input = parse_input(input_json)?;
    input
        .validate_tax_year(chrono::Local::now().year() + 1)
        .map_err(to_napi_error)?;
    Ok(input)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn run_projection(input_json: String) -> NapiResult<String> {
    let input = parse_checked_input(&input_json)?;
    let output = denkmal_core::run_projection(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_investment(input_json: String) -> NapiResult<String> {
    let input = parse_checked_input(&input_json)?;
    let output = denkmal_core::projection::run_investment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_financing_schedule(input_json: String) -> NapiResult<String> {
    let input = parse_checked_input(&input_json)?;
    let output = denkmal_core::projection::run_financing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_depreciation_schedule(input_json: String) -> NapiResult<String> {
    let input = parse_checked_input(&input_json)?;
    let output = denkmal_core::projection::run_depreciation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Parameter record
// ---------------------------------------------------------------------------

/// Flat record in, record with a fraction sibling for every `*_pct` key out.
#[napi]
pub fn normalize_parameters(params_json: String) -> NapiResult<String> {
    let value: serde_json::Value = serde_json::from_str(&params_json).map_err(to_napi_error)?;
    let map = value
        .as_object()
        .ok_or_else(|| to_napi_error("parameter record must be a JSON object"))?;
    let normalized = denkmal_core::params::normalize_percentages(map);
    serde_json::to_string(&normalized).map_err(to_napi_error)
}

/// Apply one field edit, e.g. `{"field": "unit_count", "value": 6}`, and
/// return the updated record.
#[napi]
pub fn apply_field_edit(input_json: String, edit_json: String) -> NapiResult<String> {
    let input = parse_input(&input_json)?;
    let edit: FieldEdit = serde_json::from_str(&edit_json).map_err(to_napi_error)?;
    let updated = denkmal_core::params::apply_edit(&input, edit);
    serde_json::to_string(&updated).map_err(to_napi_error)
}

/// Subsidized-loan limit for a unit count, as a decimal string.
#[napi]
pub fn subsidized_loan_limit(units: u32) -> String {
    denkmal_core::params::subsidized_loan_limit(units).to_string()
}

/// Cash grant on a municipal funding amount (decimal string in and out).
#[napi]
pub fn municipal_grant_from_funding(funding: String) -> NapiResult<String> {
    let amount = Decimal::from_str(funding.trim()).map_err(to_napi_error)?;
    Ok(denkmal_core::params::derive::municipal_grant_from_funding(amount).to_string())
}
