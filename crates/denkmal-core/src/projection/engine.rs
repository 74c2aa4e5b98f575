use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::depreciation::schedule::{
    SPECIAL_RATE_EARLY, SPECIAL_RATE_LATE, STRAIGHT_LINE_RATE,
};
use crate::depreciation::{build_depreciation_schedule, DepreciationSchedule};
use crate::financing::{build_financing_schedule, FinancingSchedule};
use crate::investment::acquisition::{INCIDENTAL_COST_RATE, REPAYMENT_GRANT_RATE};
use crate::investment::{calculate_investment, calculate_revenue, InvestmentResult, RevenueResult};
use crate::kpi::{calculate_kpis, KpiBundle};
use crate::params::input::ProjectionInput;
use crate::params::normalize::ProjectionParams;
use crate::projection::cash_flow::{synthesize_years, YearRow};
use crate::projection::tax::{tax_rates, TaxRates};
use crate::types::*;
use crate::DenkmalResult;

/// Full projection run: the normalized parameters next to every stage result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub params: ProjectionParams,
    pub investment: InvestmentResult,
    pub revenue: RevenueResult,
    pub tax_rates: TaxRates,
    pub years: Vec<YearRow>,
    pub kpis: KpiBundle,
    pub advisories: Vec<Advisory>,
}

/// Acquisition and rent figures without the yearly projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentOutput {
    pub investment: InvestmentResult,
    pub revenue: RevenueResult,
    pub advisories: Vec<Advisory>,
}

/// Validated, normalized input with its investment stage already computed.
struct Prepared {
    params: ProjectionParams,
    investment: InvestmentResult,
    advisories: Vec<Advisory>,
}

impl Prepared {
    fn new(input: &ProjectionInput) -> DenkmalResult<Self> {
        input.validate()?;
        let params = input.normalize();
        let mut advisories = Vec::new();
        let investment = calculate_investment(&params, &mut advisories);
        Ok(Prepared {
            params,
            investment,
            advisories,
        })
    }

    /// Rows in the projection table. No investment, no table.
    fn years(&self) -> u32 {
        if self.investment.total_investment > Decimal::ZERO {
            self.params.horizon.years()
        } else {
            0
        }
    }

    fn financing(&self) -> DenkmalResult<FinancingSchedule> {
        match self.years() {
            0 => Ok(FinancingSchedule::default()),
            years => build_financing_schedule(&self.params, &self.investment, years),
        }
    }

    fn depreciation(&self) -> DepreciationSchedule {
        build_depreciation_schedule(
            self.investment.renovation_basis,
            self.investment.old_building_basis,
            self.years(),
        )
    }
}

/// Run the full projection: validate, normalize, then investment, revenue,
/// amortization, depreciation, tax and cash-flow synthesis and KPIs.
///
/// Invalid input and a failed annuity abort the run; every other condition is
/// reported as an advisory next to the result.
pub fn run_projection(
    input: &ProjectionInput,
) -> DenkmalResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let prepared = Prepared::new(input)?;
    let table_years = prepared.years();
    let financing = prepared.financing()?;
    let depreciation = prepared.depreciation();
    let Prepared {
        params,
        investment,
        mut advisories,
    } = prepared;

    let revenue = calculate_revenue(&params);
    let rates = tax_rates(&params);
    log::debug!(
        "projection '{}': {} years, total investment {}",
        params.object_name,
        table_years,
        investment.total_investment
    );

    let years = synthesize_years(
        &params,
        &investment,
        &revenue,
        &financing,
        &depreciation,
        &rates,
        table_years,
    )?;
    let kpis = calculate_kpis(&params, &investment, &revenue, &years, &mut advisories)?;

    let warnings = advisory_warnings(&advisories);
    let assumptions = serde_json::json!({
        "acquisition_model": params.acquisition_model,
        "horizon_years": params.horizon.years(),
        "incidental_cost_rate": INCIDENTAL_COST_RATE.to_string(),
        "repayment_grant_rate": REPAYMENT_GRANT_RATE.to_string(),
        "special_depreciation": format!(
            "{SPECIAL_RATE_EARLY} years 1-8, {SPECIAL_RATE_LATE} years 9-12"
        ),
        "straight_line_rate": STRAIGHT_LINE_RATE.to_string(),
        "gross_marginal_tax_rate": rates.gross_rate.to_string(),
    });

    let output = ProjectionOutput {
        params,
        investment,
        revenue,
        tax_rates: rates,
        years,
        kpis,
        advisories,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Listed-building investment projection: acquisition, subsidized financing, \
         special depreciation, after-tax cash flow, IRR",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Acquisition costs, depreciation bases, financing split and year-1 rent.
pub fn run_investment(input: &ProjectionInput) -> DenkmalResult<ComputationOutput<InvestmentOutput>> {
    let start = Instant::now();
    let prepared = Prepared::new(input)?;
    let revenue = calculate_revenue(&prepared.params);

    let warnings = advisory_warnings(&prepared.advisories);
    let output = InvestmentOutput {
        investment: prepared.investment,
        revenue,
        advisories: prepared.advisories,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Acquisition costs, depreciation bases and financing split",
        &serde_json::json!({
            "acquisition_model": prepared.params.acquisition_model,
            "incidental_cost_rate": INCIDENTAL_COST_RATE.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Bank and subsidized loan schedules over the projection horizon.
pub fn run_financing(input: &ProjectionInput) -> DenkmalResult<ComputationOutput<FinancingSchedule>> {
    let start = Instant::now();
    let prepared = Prepared::new(input)?;
    let schedule = prepared.financing()?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bank annuity loan and subsidized loan with grant credit",
        &serde_json::json!({
            "repayment_regime": prepared.params.repayment_regime,
            "subsidized_term_years": prepared.params.subsidized_term_years,
            "bank_loan": prepared.investment.bank_loan.to_string(),
            "subsidized_loan_total": prepared.investment.subsidized_loan_total.to_string(),
        }),
        advisory_warnings(&prepared.advisories),
        elapsed,
        schedule,
    ))
}

/// Special and straight-line depreciation over the projection horizon.
pub fn run_depreciation(
    input: &ProjectionInput,
) -> DenkmalResult<ComputationOutput<DepreciationSchedule>> {
    let start = Instant::now();
    let prepared = Prepared::new(input)?;
    let schedule = prepared.depreciation();

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Listed-building special depreciation and straight-line depreciation",
        &serde_json::json!({
            "special_rates": format!("{SPECIAL_RATE_EARLY} / {SPECIAL_RATE_LATE}"),
            "straight_line_rate": STRAIGHT_LINE_RATE.to_string(),
        }),
        advisory_warnings(&prepared.advisories),
        elapsed,
        schedule,
    ))
}
