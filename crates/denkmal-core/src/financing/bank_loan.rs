use rust_decimal::Decimal;

use crate::financing::schedule::{settle, LoanPeriod, LoanSchedule, BALANCE_EPSILON};
use crate::types::{Money, Rate};

/// Bank loan with a fixed annuity of `principal × (rate + initial amortization)`.
///
/// Interest accrues on the opening balance and the rest of the installment
/// repays principal, never more than the outstanding balance. A loan without
/// interest and without amortization keeps its balance and reports no flows.
pub fn build_bank_schedule(
    principal: Money,
    rate: Rate,
    initial_amortization: Rate,
    years: u32,
) -> LoanSchedule {
    let installment = principal * (rate + initial_amortization);
    let mut balance = principal.max(Decimal::ZERO);
    let mut periods = Vec::with_capacity(years as usize);

    for year in 1..=years {
        if balance <= BALANCE_EPSILON {
            periods.push(LoanPeriod::repaid(year));
            balance = Decimal::ZERO;
            continue;
        }

        let opening = balance;
        let interest = opening * rate;
        let repayment = (installment - interest).max(Decimal::ZERO).min(opening);
        let (closing, repayment) = settle(opening - repayment, repayment);
        balance = closing;

        periods.push(LoanPeriod {
            year,
            opening_balance: opening,
            interest,
            principal: repayment,
            grant_applied: Decimal::ZERO,
            closing_balance: closing,
        });
    }

    LoanSchedule::from_periods(principal, periods)
}
