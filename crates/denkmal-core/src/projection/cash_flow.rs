use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::depreciation::DepreciationSchedule;
use crate::financing::FinancingSchedule;
use crate::investment::{InvestmentResult, RevenueResult};
use crate::params::normalize::ProjectionParams;
use crate::projection::tax::TaxRates;
use crate::time_value::growth_factor;
use crate::types::Money;
use crate::DenkmalResult;

/// One row of the projection table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearRow {
    pub year: u32,

    // Operations
    pub net_rent: Money,
    pub operating_cost: Money,
    pub income_surplus: Money,
    pub property_value: Money,

    // Financing
    pub bank_interest: Money,
    pub bank_principal: Money,
    pub bank_balance: Money,
    pub subsidized_interest: Money,
    pub subsidized_principal: Money,
    pub subsidized_grant_applied: Money,
    pub subsidized_balance: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_debt_service: Money,
    pub total_balance: Money,

    // Depreciation and tax
    pub special_depreciation: Money,
    pub straight_line_depreciation: Money,
    pub total_depreciation: Money,
    /// Surplus minus interest minus depreciation; negative is a tax loss
    pub taxable_result: Money,
    /// Positive when the loss reduces the investor's tax
    pub tax_saving: Money,

    // Cash flow
    pub pre_tax_cash_flow: Money,
    /// Municipal and regional grants, paid out in year 1
    pub one_time_inflow: Money,
    pub post_tax_cash_flow: Money,
    pub net_wealth: Money,
}

/// Combine the stage results into the yearly projection table.
pub fn synthesize_years(
    params: &ProjectionParams,
    investment: &InvestmentResult,
    revenue: &RevenueResult,
    financing: &FinancingSchedule,
    depreciation: &DepreciationSchedule,
    rates: &TaxRates,
    years: u32,
) -> DenkmalResult<Vec<YearRow>> {
    let one_time_grants = investment.municipal_grant + investment.regional_grant;
    let mut rows = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let idx = (year - 1) as usize;

        let net_rent = revenue.net_annual_rent * growth_factor(params.rent_growth, year - 1)?;
        let operating_cost =
            revenue.annual_admin_cost * growth_factor(params.cost_growth, year - 1)?;
        let income_surplus = net_rent - operating_cost;
        let property_value = investment.gross_total * growth_factor(params.value_growth, year)?;

        let bank = financing.bank.period(year);
        let subsidized = financing.subsidized.period(year);
        let totals = financing.years.get(idx).cloned().unwrap_or_default();
        let dep = depreciation.years.get(idx).cloned().unwrap_or_default();

        let taxable_result = income_surplus - totals.total_interest - dep.total;
        let tax_saving = -taxable_result * rates.gross_rate;
        let pre_tax_cash_flow = income_surplus - totals.total_debt_service;
        let one_time_inflow = if year == 1 {
            one_time_grants
        } else {
            Decimal::ZERO
        };

        rows.push(YearRow {
            year,
            net_rent,
            operating_cost,
            income_surplus,
            property_value,
            bank_interest: bank.interest,
            bank_principal: bank.principal,
            bank_balance: bank.closing_balance,
            subsidized_interest: subsidized.interest,
            subsidized_principal: subsidized.principal,
            subsidized_grant_applied: subsidized.grant_applied,
            subsidized_balance: subsidized.closing_balance,
            total_interest: totals.total_interest,
            total_principal: totals.total_principal,
            total_debt_service: totals.total_debt_service,
            total_balance: totals.total_balance,
            special_depreciation: dep.special,
            straight_line_depreciation: dep.straight_line,
            total_depreciation: dep.total,
            taxable_result,
            tax_saving,
            pre_tax_cash_flow,
            one_time_inflow,
            post_tax_cash_flow: pre_tax_cash_flow + tax_saving + one_time_inflow,
            net_wealth: property_value - totals.total_balance,
        });
    }

    Ok(rows)
}
