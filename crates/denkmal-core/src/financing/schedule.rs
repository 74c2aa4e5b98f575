use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financing::bank_loan::build_bank_schedule;
use crate::financing::subsidized_loan::build_subsidized_schedule;
use crate::investment::InvestmentResult;
use crate::params::normalize::ProjectionParams;
use crate::types::Money;
use crate::DenkmalResult;

/// Balances at or below this amount count as repaid.
pub const BALANCE_EPSILON: Money = dec!(0.01);

/// A single year of one loan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanPeriod {
    pub year: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    /// Grant credited against the balance in this year
    pub grant_applied: Money,
    pub closing_balance: Money,
}

impl LoanPeriod {
    /// All-zero row for a repaid or matured loan.
    pub fn repaid(year: u32) -> Self {
        LoanPeriod {
            year,
            ..Default::default()
        }
    }
}

/// Year-by-year schedule of one loan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub principal_amount: Money,
    pub periods: Vec<LoanPeriod>,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    pub total_grant_applied: Money,
}

impl LoanSchedule {
    pub(crate) fn from_periods(principal_amount: Money, periods: Vec<LoanPeriod>) -> Self {
        let total_interest_paid = periods.iter().map(|p| p.interest).sum();
        let total_principal_paid = periods.iter().map(|p| p.principal).sum();
        let total_grant_applied = periods.iter().map(|p| p.grant_applied).sum();
        LoanSchedule {
            principal_amount,
            periods,
            total_interest_paid,
            total_principal_paid,
            total_grant_applied,
        }
    }

    /// Period for a 1-based year; a zero row beyond the schedule.
    pub fn period(&self, year: u32) -> LoanPeriod {
        year.checked_sub(1)
            .and_then(|idx| self.periods.get(idx as usize))
            .cloned()
            .unwrap_or_else(|| LoanPeriod::repaid(year))
    }
}

/// Both loans combined for one year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancingYear {
    pub year: u32,
    pub total_interest: Money,
    pub total_principal: Money,
    /// Interest plus principal; grants are not part of the debt service
    pub total_debt_service: Money,
    pub total_balance: Money,
}

/// Bank and subsidized loan schedules with their per-year aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancingSchedule {
    pub bank: LoanSchedule,
    pub subsidized: LoanSchedule,
    pub years: Vec<FinancingYear>,
}

/// Amortize both loans over `years` and aggregate them per year.
///
/// Fails when the subsidized annuity cannot be computed.
pub fn build_financing_schedule(
    params: &ProjectionParams,
    investment: &InvestmentResult,
    years: u32,
) -> DenkmalResult<FinancingSchedule> {
    let bank = build_bank_schedule(
        investment.bank_loan,
        params.bank_interest,
        params.bank_amortization,
        years,
    );

    let grant = investment.repayment_grant + investment.supervision_grant;
    let subsidized = build_subsidized_schedule(
        investment.subsidized_loan_total,
        params.subsidized_interest,
        params.subsidized_term_years,
        params.repayment_regime,
        grant,
        years,
    )?;

    let years = (1..=years)
        .map(|year| {
            let b = bank.period(year);
            let s = subsidized.period(year);
            let total_interest = b.interest + s.interest;
            let total_principal = b.principal + s.principal;
            FinancingYear {
                year,
                total_interest,
                total_principal,
                total_debt_service: total_interest + total_principal,
                total_balance: b.closing_balance + s.closing_balance,
            }
        })
        .collect();

    Ok(FinancingSchedule {
        bank,
        subsidized,
        years,
    })
}

/// Snap a residual balance to zero, moving it into the principal repaid.
pub(crate) fn settle(closing: Money, principal: Money) -> (Money, Money) {
    if closing <= BALANCE_EPSILON {
        (Decimal::ZERO, principal + closing)
    } else {
        (closing, principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investment::calculate_investment;
    use crate::params::input::ProjectionInput;

    #[test]
    fn test_aggregate_matches_components() {
        let input = ProjectionInput {
            net_investment: dec!(1000000),
            units: 6,
            subsidized_loan_base: dec!(900000),
            equity_ratio_pct: dec!(10),
            ..Default::default()
        };
        let params = input.normalize();
        let inv = calculate_investment(&params, &mut Vec::new());
        let fin = build_financing_schedule(&params, &inv, 35).unwrap();

        assert_eq!(fin.years.len(), 35);
        for fy in &fin.years {
            let b = fin.bank.period(fy.year);
            let s = fin.subsidized.period(fy.year);
            assert_eq!(fy.total_interest, b.interest + s.interest);
            assert_eq!(fy.total_principal, b.principal + s.principal);
            assert_eq!(fy.total_debt_service, fy.total_interest + fy.total_principal);
            assert_eq!(fy.total_balance, b.closing_balance + s.closing_balance);
            assert!(fy.total_balance >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_period_beyond_schedule_is_zero() {
        let schedule = LoanSchedule::default();
        assert_eq!(schedule.period(3), LoanPeriod::repaid(3));
        assert_eq!(schedule.period(0), LoanPeriod::repaid(0));
    }

    #[test]
    fn test_settle_snaps_small_residual() {
        assert_eq!(settle(dec!(0.004), dec!(100)), (Decimal::ZERO, dec!(100.004)));
        assert_eq!(settle(dec!(5), dec!(100)), (dec!(5), dec!(100)));
    }
}
