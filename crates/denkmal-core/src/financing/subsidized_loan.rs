use rust_decimal::Decimal;

use crate::error::DenkmalError;
use crate::financing::schedule::{settle, LoanPeriod, LoanSchedule, BALANCE_EPSILON};
use crate::params::normalize::RepaymentRegime;
use crate::time_value::annuity_payment;
use crate::types::{Money, Rate};
use crate::DenkmalResult;

/// Amortize the subsidized loan and credit its grant exactly once.
///
/// * `Annuity { grace_years: g }`: interest only for years `1..=g`. The grant
///   is credited at the start of year `g + 1`, before the annuity over the
///   remaining `term - g` years is computed on the reduced balance. Without a
///   grace period the grant arrives at the end of year 1 and the annuity is
///   recomputed over `term - 1` years. A one-year term credits the grant in
///   its only year, ahead of the final repayment.
/// * `Bullet`: interest only until maturity; in the final year the grant is
///   credited and the rest of the balance repaid.
///
/// Rows after maturity or after full repayment are all zero.
pub fn build_subsidized_schedule(
    principal: Money,
    rate: Rate,
    term_years: u32,
    regime: RepaymentRegime,
    grant: Money,
    years: u32,
) -> DenkmalResult<LoanSchedule> {
    if let RepaymentRegime::Annuity { grace_years } = regime {
        if grace_years >= term_years {
            return Err(DenkmalError::ComputationFailed {
                stage: "subsidized_loan".into(),
                reason: format!(
                    "grace period of {grace_years} years leaves no repayment years in a \
                     {term_years}-year term"
                ),
            });
        }
    }

    let mut balance = principal.max(Decimal::ZERO);
    let mut pending_grant = grant.max(Decimal::ZERO);
    let mut annuity = Decimal::ZERO;
    let mut periods = Vec::with_capacity(years as usize);

    for year in 1..=years {
        if year > term_years || balance <= BALANCE_EPSILON {
            periods.push(LoanPeriod::repaid(year));
            balance = Decimal::ZERO;
            continue;
        }

        let opening = balance;
        let mut grant_applied = Decimal::ZERO;
        let interest;
        let mut repayment = Decimal::ZERO;

        match regime {
            RepaymentRegime::Annuity { grace_years } => {
                if grace_years > 0 && year == grace_years + 1 {
                    grant_applied = pending_grant.min(balance);
                    pending_grant = Decimal::ZERO;
                    balance -= grant_applied;
                    annuity = annuity_payment(balance, rate, term_years - grace_years)?;
                    log::debug!(
                        "subsidized annuity {annuity} over {} years after grant {grant_applied}",
                        term_years - grace_years
                    );
                }

                interest = balance * rate;

                if year > grace_years {
                    if grace_years == 0 && year == 1 {
                        annuity = annuity_payment(balance, rate, term_years)?;
                    }

                    if year == term_years {
                        // Maturity: a grant still pending settles before the final repayment
                        let credit = pending_grant.min(balance);
                        pending_grant = Decimal::ZERO;
                        grant_applied += credit;
                        balance -= credit;
                        repayment = balance;
                    } else {
                        repayment = (annuity - interest).max(Decimal::ZERO).min(balance);
                    }
                    balance -= repayment;

                    if grace_years == 0 && year == 1 && term_years > 1 {
                        grant_applied = pending_grant.min(balance);
                        pending_grant = Decimal::ZERO;
                        balance -= grant_applied;
                        annuity = annuity_payment(balance, rate, term_years - 1)?;
                        log::debug!(
                            "subsidized annuity recomputed to {annuity} after year-1 grant {grant_applied}"
                        );
                    }
                }
            }
            RepaymentRegime::Bullet => {
                interest = balance * rate;
                if year == term_years {
                    grant_applied = pending_grant.min(balance);
                    pending_grant = Decimal::ZERO;
                    repayment = balance - grant_applied;
                    balance = Decimal::ZERO;
                }
            }
        }

        let (closing, repayment) = settle(balance, repayment);
        balance = closing;

        periods.push(LoanPeriod {
            year,
            opening_balance: opening,
            interest,
            principal: repayment,
            grant_applied,
            closing_balance: closing,
        });
    }

    Ok(LoanSchedule::from_periods(principal, periods))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const PRINCIPAL: Decimal = dec!(900000);
    const GRANT: Decimal = dec!(360000);
    const RATE: Decimal = dec!(0.0286);

    fn assert_monotone(schedule: &LoanSchedule) {
        let mut previous = schedule.principal_amount;
        for p in &schedule.periods {
            assert!(p.closing_balance >= Decimal::ZERO, "year {}", p.year);
            assert!(p.closing_balance <= previous, "year {} balance rose", p.year);
            previous = p.closing_balance;
        }
    }

    #[test]
    fn test_annuity_with_grace_period() {
        let s = build_subsidized_schedule(
            PRINCIPAL,
            RATE,
            30,
            RepaymentRegime::Annuity { grace_years: 4 },
            GRANT,
            35,
        )
        .unwrap();

        for p in &s.periods[..4] {
            assert_eq!(p.principal, Decimal::ZERO);
            assert_eq!(p.interest, PRINCIPAL * RATE);
            assert_eq!(p.closing_balance, PRINCIPAL);
        }

        let y5 = &s.periods[4];
        assert_eq!(y5.grant_applied, GRANT);
        // Interest on the grant-reduced balance
        assert_eq!(y5.interest, (PRINCIPAL - GRANT) * RATE);
        assert!(y5.principal > Decimal::ZERO);
        let expected_annuity = annuity_payment(PRINCIPAL - GRANT, RATE, 26).unwrap();
        assert!((y5.interest + y5.principal - expected_annuity).abs() < dec!(0.000001));

        assert!(s.periods[..30].iter().any(|p| p.closing_balance.is_zero()));
        assert_eq!(s.periods[29].closing_balance, Decimal::ZERO);
        for p in &s.periods[30..] {
            assert_eq!(*p, LoanPeriod::repaid(p.year));
        }
        assert_eq!(s.total_grant_applied, GRANT);
        assert!((s.total_principal_paid + s.total_grant_applied - PRINCIPAL).abs() < dec!(0.01));
        assert_monotone(&s);
    }

    #[test]
    fn test_annuity_without_grace_credits_grant_end_of_year_one() {
        let s = build_subsidized_schedule(
            PRINCIPAL,
            RATE,
            30,
            RepaymentRegime::Annuity { grace_years: 0 },
            GRANT,
            35,
        )
        .unwrap();

        let y1 = &s.periods[0];
        let first_annuity = annuity_payment(PRINCIPAL, RATE, 30).unwrap();
        assert_eq!(y1.interest, PRINCIPAL * RATE);
        assert!((y1.interest + y1.principal - first_annuity).abs() < dec!(0.000001));
        assert_eq!(y1.grant_applied, GRANT);
        assert_eq!(y1.closing_balance, PRINCIPAL - y1.principal - GRANT);

        let y2 = &s.periods[1];
        let recomputed = annuity_payment(y1.closing_balance, RATE, 29).unwrap();
        assert!((y2.interest + y2.principal - recomputed).abs() < dec!(0.000001));
        assert_eq!(s.periods[29].closing_balance, Decimal::ZERO);
        assert_monotone(&s);
    }

    #[test]
    fn test_one_year_term_credits_grant_before_final_repayment() {
        let s = build_subsidized_schedule(
            PRINCIPAL,
            RATE,
            1,
            RepaymentRegime::Annuity { grace_years: 0 },
            GRANT,
            35,
        )
        .unwrap();

        let y1 = &s.periods[0];
        assert_eq!(y1.interest, PRINCIPAL * RATE);
        assert_eq!(y1.grant_applied, GRANT);
        assert_eq!(y1.principal, PRINCIPAL - GRANT);
        assert_eq!(y1.closing_balance, Decimal::ZERO);
        for p in &s.periods[1..] {
            assert_eq!(*p, LoanPeriod::repaid(p.year));
        }
        assert_eq!(s.total_grant_applied, GRANT);
        assert_eq!(s.total_principal_paid + s.total_grant_applied, PRINCIPAL);
    }

    #[test]
    fn test_one_year_term_grant_larger_than_balance() {
        let s = build_subsidized_schedule(
            dec!(100000),
            RATE,
            1,
            RepaymentRegime::Annuity { grace_years: 0 },
            dec!(150000),
            5,
        )
        .unwrap();
        let y1 = &s.periods[0];
        assert_eq!(y1.grant_applied, dec!(100000));
        assert_eq!(y1.principal, Decimal::ZERO);
        assert_eq!(y1.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_two_year_term_without_grace() {
        let s = build_subsidized_schedule(
            PRINCIPAL,
            RATE,
            2,
            RepaymentRegime::Annuity { grace_years: 0 },
            GRANT,
            35,
        )
        .unwrap();

        let y1 = &s.periods[0];
        let first_annuity = annuity_payment(PRINCIPAL, RATE, 2).unwrap();
        assert!((y1.interest + y1.principal - first_annuity).abs() < dec!(0.000001));
        assert_eq!(y1.grant_applied, GRANT);
        assert_eq!(y1.closing_balance, PRINCIPAL - y1.principal - GRANT);

        let y2 = &s.periods[1];
        assert_eq!(y2.opening_balance, y1.closing_balance);
        assert_eq!(y2.grant_applied, Decimal::ZERO);
        assert_eq!(y2.principal, y1.closing_balance);
        assert_eq!(y2.closing_balance, Decimal::ZERO);

        assert_eq!(s.total_grant_applied, GRANT);
        assert!((s.total_principal_paid + s.total_grant_applied - PRINCIPAL).abs() < dec!(0.000001));
        assert_monotone(&s);
    }

    #[test]
    fn test_one_year_grace_credits_grant_in_year_two() {
        let s = build_subsidized_schedule(
            PRINCIPAL,
            RATE,
            30,
            RepaymentRegime::Annuity { grace_years: 1 },
            GRANT,
            35,
        )
        .unwrap();

        let y1 = &s.periods[0];
        assert_eq!(y1.principal, Decimal::ZERO);
        assert_eq!(y1.grant_applied, Decimal::ZERO);
        assert_eq!(y1.interest, PRINCIPAL * RATE);
        assert_eq!(y1.closing_balance, PRINCIPAL);

        let y2 = &s.periods[1];
        assert_eq!(y2.grant_applied, GRANT);
        assert_eq!(y2.interest, (PRINCIPAL - GRANT) * RATE);
        let annuity = annuity_payment(PRINCIPAL - GRANT, RATE, 29).unwrap();
        assert!((y2.interest + y2.principal - annuity).abs() < dec!(0.000001));

        let y3 = &s.periods[2];
        assert!((y3.interest + y3.principal - annuity).abs() < dec!(0.000001));

        assert_eq!(s.periods[29].closing_balance, Decimal::ZERO);
        assert_eq!(s.total_grant_applied, GRANT);
        assert!((s.total_principal_paid + s.total_grant_applied - PRINCIPAL).abs() < dec!(0.01));
        assert_monotone(&s);
    }

    #[test]
    fn test_grace_period_equal_to_term_is_fatal() {
        let result = build_subsidized_schedule(
            PRINCIPAL,
            RATE,
            10,
            RepaymentRegime::Annuity { grace_years: 10 },
            GRANT,
            35,
        );
        assert!(matches!(
            result,
            Err(DenkmalError::ComputationFailed { .. })
        ));
    }

    #[test]
    fn test_bullet_regime() {
        let s =
            build_subsidized_schedule(PRINCIPAL, RATE, 20, RepaymentRegime::Bullet, GRANT, 35)
                .unwrap();

        for p in &s.periods[..19] {
            assert_eq!(p.principal, Decimal::ZERO);
            assert_eq!(p.interest, PRINCIPAL * RATE);
            assert_eq!(p.closing_balance, PRINCIPAL);
        }
        let y20 = &s.periods[19];
        assert_eq!(y20.grant_applied, GRANT);
        assert_eq!(y20.principal, PRINCIPAL - GRANT);
        assert_eq!(y20.closing_balance, Decimal::ZERO);
        for p in &s.periods[20..] {
            assert_eq!(*p, LoanPeriod::repaid(p.year));
        }
    }

    #[test]
    fn test_bullet_grant_larger_than_balance() {
        let s = build_subsidized_schedule(
            dec!(100000),
            RATE,
            5,
            RepaymentRegime::Bullet,
            dec!(150000),
            10,
        )
        .unwrap();
        let y5 = &s.periods[4];
        assert_eq!(y5.grant_applied, dec!(100000));
        assert_eq!(y5.principal, Decimal::ZERO);
        assert_eq!(y5.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_annuity_is_straight_line() {
        let s = build_subsidized_schedule(
            dec!(1000),
            Decimal::ZERO,
            10,
            RepaymentRegime::Annuity { grace_years: 5 },
            dec!(500),
            12,
        )
        .unwrap();
        // 500 left after the grant, repaid over 5 years
        for p in &s.periods[5..10] {
            assert_eq!(p.principal, dec!(100));
        }
        assert_eq!(s.periods[9].closing_balance, Decimal::ZERO);
    }

    #[test]
    fn test_zero_principal_reports_zero_rows() {
        let s = build_subsidized_schedule(
            Decimal::ZERO,
            RATE,
            30,
            RepaymentRegime::Annuity { grace_years: 4 },
            Decimal::ZERO,
            30,
        )
        .unwrap();
        assert!(s.periods.iter().all(|p| *p == LoanPeriod::repaid(p.year)));
    }
}
