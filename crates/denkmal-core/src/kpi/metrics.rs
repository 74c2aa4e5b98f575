use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DenkmalError;
use crate::investment::{InvestmentResult, RevenueResult};
use crate::kpi::irr::{calculate_irr, investor_cash_flows, Irr};
use crate::params::normalize::ProjectionParams;
use crate::projection::cash_flow::YearRow;
use crate::types::{Advisory, Money, Rate};
use crate::DenkmalResult;

/// Return on equity. Zero equity with a profit has no finite ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReturnOnEquity {
    Ratio(Rate),
    Unbounded,
}

/// Summary figures over the holding period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiBundle {
    /// Net annual rent / total investment
    pub gross_yield: Rate,
    /// Year-1 income surplus / total investment
    pub net_yield: Rate,
    pub price_per_sqm_gross: Money,
    /// After grants
    pub price_per_sqm_net: Money,
    /// After grants and the tax saving over the holding period
    pub price_per_sqm_effective: Money,
    pub holding_period_requested: u32,
    pub holding_period_used: u32,
    /// Net wealth in the exit year
    pub exit_proceeds: Money,
    pub cumulative_post_tax_cash_flow: Money,
    pub cumulative_tax_saving: Money,
    pub total_profit: Money,
    pub return_on_equity: ReturnOnEquity,
    pub irr: Irr,
}

/// `numerator / denominator`, failing instead of overflowing on tiny denominators.
fn ratio(numerator: Decimal, denominator: Decimal, what: &str) -> DenkmalResult<Decimal> {
    numerator
        .checked_div(denominator)
        .ok_or_else(|| DenkmalError::ComputationFailed {
            stage: "kpi".into(),
            reason: format!("{what}: {numerator} / {denominator} leaves the decimal range"),
        })
}

/// Derive the KPI bundle from the projection table.
///
/// An empty table (no investment) yields zero KPIs and an unavailable IRR
/// without recording advisories.
pub fn calculate_kpis(
    params: &ProjectionParams,
    investment: &InvestmentResult,
    revenue: &RevenueResult,
    rows: &[YearRow],
    advisories: &mut Vec<Advisory>,
) -> DenkmalResult<KpiBundle> {
    let total_investment = investment.total_investment;
    let (gross_yield, net_yield) = if total_investment > Decimal::ZERO {
        (
            ratio(revenue.net_annual_rent, total_investment, "gross yield")?,
            ratio(revenue.income_surplus, total_investment, "net yield")?,
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let requested = params.holding_period_years;
    let table_len = u32::try_from(rows.len()).unwrap_or(u32::MAX);
    let used = requested.min(table_len);
    if used < requested && !rows.is_empty() {
        log::warn!("holding period {requested} truncated to {used} years");
        advisories.push(Advisory::HoldingPeriodTruncated { requested, used });
    }

    let held = &rows[..used as usize];
    let exit_proceeds = held.last().map(|r| r.net_wealth).unwrap_or(Decimal::ZERO);
    let cumulative_post_tax_cash_flow: Money = held.iter().map(|r| r.post_tax_cash_flow).sum();
    let cumulative_tax_saving: Money = held.iter().map(|r| r.tax_saving).sum();

    let area = params.living_area;
    let (price_per_sqm_gross, price_per_sqm_net, price_per_sqm_effective) = if area > Decimal::ZERO
    {
        let net = ratio(total_investment - investment.total_grant, area, "net price per m²")?;
        (
            ratio(investment.gross_total, area, "gross price per m²")?,
            net,
            net - ratio(cumulative_tax_saving, area, "tax saving per m²")?,
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    };

    let equity = investment.equity;
    let total_profit = cumulative_post_tax_cash_flow + exit_proceeds - equity;
    let return_on_equity = if equity > Decimal::ZERO {
        ReturnOnEquity::Ratio(ratio(total_profit, equity, "return on equity")?)
    } else if total_profit > Decimal::ZERO {
        ReturnOnEquity::Unbounded
    } else {
        ReturnOnEquity::Ratio(Decimal::ZERO)
    };

    let post_tax: Vec<Money> = held.iter().map(|r| r.post_tax_cash_flow).collect();
    let irr = calculate_irr(&investor_cash_flows(equity, &post_tax, exit_proceeds));
    if !rows.is_empty() {
        match &irr {
            Irr::Converged { .. } => {}
            Irr::NotConverged { reason } => advisories.push(Advisory::IrrNotConverged {
                reason: reason.clone(),
            }),
            Irr::Unavailable { reason } => advisories.push(Advisory::IrrUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    Ok(KpiBundle {
        gross_yield,
        net_yield,
        price_per_sqm_gross,
        price_per_sqm_net,
        price_per_sqm_effective,
        holding_period_requested: requested,
        holding_period_used: used,
        exit_proceeds,
        cumulative_post_tax_cash_flow,
        cumulative_tax_saving,
        total_profit,
        return_on_equity,
        irr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::input::ProjectionInput;
    use rust_decimal_macros::dec;

    fn row(year: u32, post_tax: Money, tax_saving: Money, net_wealth: Money) -> YearRow {
        YearRow {
            year,
            post_tax_cash_flow: post_tax,
            tax_saving,
            net_wealth,
            ..Default::default()
        }
    }

    fn investment(equity: Money) -> InvestmentResult {
        InvestmentResult {
            gross_total: dec!(1000),
            total_investment: dec!(1000),
            total_grant: dec!(200),
            equity,
            ..Default::default()
        }
    }

    #[test]
    fn test_profit_and_return_on_equity() {
        let params = ProjectionInput {
            holding_period_years: 2,
            living_area: dec!(10),
            ..Default::default()
        }
        .normalize();
        let rows = vec![
            row(1, dec!(10), dec!(5), dec!(500)),
            row(2, dec!(10), dec!(5), dec!(600)),
            row(3, dec!(99), dec!(99), dec!(999)),
        ];
        let mut advisories = Vec::new();
        let k = calculate_kpis(
            &params,
            &investment(dec!(400)),
            &RevenueResult::default(),
            &rows,
            &mut advisories,
        )
        .unwrap();

        assert_eq!(k.holding_period_used, 2);
        assert_eq!(k.exit_proceeds, dec!(600));
        assert_eq!(k.cumulative_post_tax_cash_flow, dec!(20));
        assert_eq!(k.cumulative_tax_saving, dec!(10));
        assert_eq!(k.total_profit, dec!(220));
        assert_eq!(k.return_on_equity, ReturnOnEquity::Ratio(dec!(0.55)));
        assert_eq!(k.price_per_sqm_gross, dec!(100));
        assert_eq!(k.price_per_sqm_net, dec!(80));
        assert_eq!(k.price_per_sqm_effective, dec!(79));
        assert!(k.irr.rate().is_some());
        assert!(advisories.is_empty());
    }

    #[test]
    fn test_zero_equity_profit_is_unbounded() {
        let params = ProjectionInput {
            holding_period_years: 1,
            ..Default::default()
        }
        .normalize();
        let rows = vec![row(1, dec!(10), Decimal::ZERO, dec!(100))];
        let k = calculate_kpis(
            &params,
            &investment(Decimal::ZERO),
            &RevenueResult::default(),
            &rows,
            &mut Vec::new(),
        )
        .unwrap();
        assert_eq!(k.return_on_equity, ReturnOnEquity::Unbounded);
        // [0, 110] has no sign change
        assert!(matches!(k.irr, Irr::Unavailable { .. }));
    }

    #[test]
    fn test_holding_period_truncated_to_table() {
        let params = ProjectionInput {
            holding_period_years: 40,
            ..Default::default()
        }
        .normalize();
        let rows: Vec<YearRow> = (1..=35)
            .map(|y| row(y, dec!(1), Decimal::ZERO, Decimal::from(y)))
            .collect();
        let mut advisories = Vec::new();
        let k = calculate_kpis(
            &params,
            &investment(dec!(10)),
            &RevenueResult::default(),
            &rows,
            &mut advisories,
        )
        .unwrap();
        assert_eq!(k.holding_period_used, 35);
        assert_eq!(k.exit_proceeds, dec!(35));
        assert_eq!(k.cumulative_post_tax_cash_flow, dec!(35));
        assert!(advisories.contains(&Advisory::HoldingPeriodTruncated {
            requested: 40,
            used: 35
        }));
    }

    #[test]
    fn test_ratio_overflow_is_computation_failure() {
        let params = ProjectionInput {
            holding_period_years: 1,
            ..Default::default()
        }
        .normalize();
        let rows = vec![row(1, dec!(10), Decimal::ZERO, dec!(1000000000000))];
        let result = calculate_kpis(
            &params,
            &investment(Decimal::new(1, 28)),
            &RevenueResult::default(),
            &rows,
            &mut Vec::new(),
        );
        assert!(matches!(
            result,
            Err(DenkmalError::ComputationFailed { .. })
        ));
    }

    #[test]
    fn test_empty_table_gives_zero_kpis() {
        let params = ProjectionInput::default().normalize();
        let mut advisories = Vec::new();
        let k = calculate_kpis(
            &params,
            &InvestmentResult::default(),
            &RevenueResult::default(),
            &[],
            &mut advisories,
        )
        .unwrap();
        assert_eq!(k.gross_yield, Decimal::ZERO);
        assert_eq!(k.exit_proceeds, Decimal::ZERO);
        assert_eq!(k.total_profit, Decimal::ZERO);
        assert_eq!(k.return_on_equity, ReturnOnEquity::Ratio(Decimal::ZERO));
        assert!(matches!(k.irr, Irr::Unavailable { .. }));
        assert!(advisories.is_empty());
    }
}
