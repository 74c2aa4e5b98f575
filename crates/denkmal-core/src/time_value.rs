use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::DenkmalError;
use crate::types::{Money, Rate};
use crate::DenkmalResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const RATE_TOLERANCE: Decimal = dec!(0.0000000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;

/// Candidate rates scanned for a sign change when Newton-Raphson fails.
const BRACKET_GRID: [Decimal; 12] = [
    dec!(-0.9),
    dec!(-0.75),
    dec!(-0.5),
    dec!(-0.25),
    dec!(-0.1),
    dec!(0),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(3),
    dec!(10),
];

/// Net Present Value of a series of annual cash flows (index 0 undiscounted).
pub fn npv(rate: Rate, cash_flows: &[Money]) -> DenkmalResult<Money> {
    if rate <= dec!(-1) {
        return Err(DenkmalError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    npv_and_derivative(cash_flows, rate)
        .map(|(value, _)| value)
        .ok_or_else(|| DenkmalError::ComputationFailed {
            stage: "npv".into(),
            reason: format!("decimal overflow discounting at rate {rate}"),
        })
}

/// Internal Rate of Return using Newton-Raphson, falling back to bisection
/// over a scanned bracket when the Newton iteration leaves the representable range.
pub fn irr(cash_flows: &[Money], guess: Rate) -> DenkmalResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(DenkmalError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    let has_negative = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    let has_positive = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    if !(has_negative && has_positive) {
        return Err(DenkmalError::InsufficientData(
            "IRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    let mut rate = guess;
    let mut last_delta = Decimal::MAX;

    for _ in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(cash_flows, rate) else {
            break;
        };
        last_delta = npv_val;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }
        if dnpv.is_zero() {
            break;
        }
        let Some(step) = npv_val.checked_div(dnpv) else {
            break;
        };

        let next = rate - step;
        if (next - rate).abs() < RATE_TOLERANCE {
            return Ok(next);
        }
        rate = next;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    log::debug!("IRR Newton-Raphson did not settle (last NPV {last_delta}); bisecting");
    bisect_irr(cash_flows).ok_or(DenkmalError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS + MAX_BISECTION_ITERATIONS,
        last_delta,
    })
}

/// Level annual payment that repays `principal` over `periods` years.
///
/// A zero rate degrades to straight-line repayment. Any failure is reported as
/// `ComputationFailed`: an annuity that cannot be computed invalidates the run.
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> DenkmalResult<Money> {
    if periods == 0 {
        return Err(DenkmalError::ComputationFailed {
            stage: "annuity".into(),
            reason: "no repayment periods remain after the grace period".into(),
        });
    }
    if principal <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let overflow = || DenkmalError::ComputationFailed {
        stage: "annuity".into(),
        reason: format!("decimal overflow compounding {rate} over {periods} periods"),
    };

    let q = Decimal::ONE + rate;
    let compound = q.checked_powu(u64::from(periods)).ok_or_else(overflow)?;
    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(DenkmalError::ComputationFailed {
            stage: "annuity".into(),
            reason: "annuity denominator is zero".into(),
        });
    }

    principal
        .checked_mul(compound)
        .and_then(|v| v.checked_mul(rate))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(overflow)
}

/// Compound growth factor `(1 + rate)^years`.
pub fn growth_factor(rate: Rate, years: u32) -> DenkmalResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powu(u64::from(years))
        .ok_or_else(|| DenkmalError::ComputationFailed {
            stage: "growth".into(),
            reason: format!("decimal overflow compounding {rate} over {years} years"),
        })
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
/// `None` when the arithmetic leaves the Decimal range.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        npv = npv.checked_add(cf.checked_mul(discount)?)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let term = Decimal::from(t as i64)
                .checked_mul(*cf)?
                .checked_mul(discount)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(term)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}

fn bisect_irr(cash_flows: &[Money]) -> Option<Rate> {
    let evaluated: Vec<(Rate, Decimal)> = BRACKET_GRID
        .iter()
        .filter_map(|&r| npv_and_derivative(cash_flows, r).map(|(v, _)| (r, v)))
        .collect();

    let (mut lo, mut hi, mut f_lo) = evaluated.windows(2).find_map(|pair| {
        let (r0, v0) = pair[0];
        let (r1, v1) = pair[1];
        if v0.is_zero() {
            Some((r0, r0, v0))
        } else if v0.is_sign_negative() != v1.is_sign_negative() {
            Some((r0, r1, v0))
        } else {
            None
        }
    })?;

    for _ in 0..MAX_BISECTION_ITERATIONS {
        if (hi - lo).abs() < RATE_TOLERANCE {
            break;
        }
        let mid = (lo + hi) / dec!(2);
        let (f_mid, _) = npv_and_derivative(cash_flows, mid)?;
        if f_mid.is_zero() {
            return Some(mid);
        }
        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Some((lo + hi) / dec!(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_negative_return() {
        // Lose half the money over two years: IRR ≈ -29.3%
        let cfs = vec![dec!(-1000), dec!(0), dec!(500)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        assert!((result - dec!(-0.2929)).abs() < dec!(0.001), "got {result}");
    }

    #[test]
    fn test_irr_requires_sign_change() {
        let cfs = vec![dec!(100), dec!(50), dec!(50)];
        assert!(matches!(
            irr(&cfs, dec!(0.10)),
            Err(DenkmalError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_irr_single_flow() {
        assert!(irr(&[dec!(-100)], dec!(0.10)).is_err());
    }

    #[test]
    fn test_annuity_payment_known_value() {
        // 100,000 at 5% over 10 years ≈ 12,950.46
        let pmt = annuity_payment(dec!(100000), dec!(0.05), 10).unwrap();
        assert!((pmt - dec!(12950.46)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_annuity_payment_zero_rate_is_straight_line() {
        let pmt = annuity_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(pmt, dec!(100));
    }

    #[test]
    fn test_annuity_payment_zero_periods_fails() {
        assert!(matches!(
            annuity_payment(dec!(1000), dec!(0.03), 0),
            Err(DenkmalError::ComputationFailed { .. })
        ));
    }

    #[test]
    fn test_growth_factor() {
        assert_eq!(growth_factor(dec!(0.10), 2).unwrap(), dec!(1.21));
        assert_eq!(growth_factor(dec!(0.02), 0).unwrap(), Decimal::ONE);
    }
}
