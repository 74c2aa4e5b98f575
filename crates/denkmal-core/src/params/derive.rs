//! Pure field derivations applied by the input surface after each edit.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DenkmalError;
use crate::params::input::ProjectionInput;
use crate::types::{Money, Rate};
use crate::DenkmalResult;

/// Maximum subsidized-loan base per residential unit.
pub const SUBSIDIZED_LOAN_LIMIT_PER_UNIT: Money = dec!(150000);

/// Share of a municipal funding amount paid out as a cash grant.
pub const MUNICIPAL_GRANT_FACTOR: Rate = dec!(0.40);

/// Tolerance applied to the renovation + land share check (in percent).
const SHARE_SUM_TOLERANCE_PCT: Decimal = dec!(0.0001);

/// A single user edit that other fields depend on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    /// Unit count changed: the loan base resets to the new limit
    UnitCount(u32),
    /// Fundable costs entered: the loan base follows, capped at the limit
    FundableCosts(Money),
    /// Loan base typed in directly: the fundable-costs override is cleared
    SubsidizedLoanBase(Money),
}

/// `units × 150,000`
pub fn subsidized_loan_limit(units: u32) -> Money {
    Decimal::from(units) * SUBSIDIZED_LOAN_LIMIT_PER_UNIT
}

/// Loan base requested by the record: the fundable-costs override when set,
/// the explicit base otherwise.
pub fn requested_loan_base(fundable_costs: Money, loan_base: Money) -> Money {
    if fundable_costs > Decimal::ZERO {
        fundable_costs
    } else {
        loan_base
    }
}

/// Apply an edit and return the record with every dependent field updated.
pub fn apply_edit(input: &ProjectionInput, edit: FieldEdit) -> ProjectionInput {
    let mut next = input.clone();
    match edit {
        FieldEdit::UnitCount(units) => {
            next.units = units;
            next.subsidized_loan_base = subsidized_loan_limit(units);
            next.fundable_costs = Decimal::ZERO;
        }
        FieldEdit::FundableCosts(amount) => {
            next.fundable_costs = amount;
            if amount > Decimal::ZERO {
                next.subsidized_loan_base = amount.min(subsidized_loan_limit(next.units));
            }
        }
        FieldEdit::SubsidizedLoanBase(amount) => {
            next.subsidized_loan_base = amount;
            next.fundable_costs = Decimal::ZERO;
        }
    }
    next
}

/// Old-building share in percent implied by the renovation and land shares.
pub fn old_building_share_pct(renovation_pct: Decimal, land_pct: Decimal) -> DenkmalResult<Decimal> {
    let sum = renovation_pct + land_pct;
    if sum > Decimal::ONE_HUNDRED + SHARE_SUM_TOLERANCE_PCT {
        return Err(DenkmalError::invalid(
            "renovation_share_pct",
            format!("renovation and land shares exceed 100% (currently {sum:.2}%)"),
        ));
    }
    Ok((Decimal::ONE_HUNDRED - sum).max(Decimal::ZERO))
}

/// Cash grant paid on a municipal funding amount.
pub fn municipal_grant_from_funding(funding_amount: Money) -> Money {
    funding_amount * MUNICIPAL_GRANT_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unit_count_resets_loan_base() {
        let input = ProjectionInput {
            fundable_costs: dec!(200000),
            subsidized_loan_base: dec!(200000),
            ..Default::default()
        };
        let next = apply_edit(&input, FieldEdit::UnitCount(6));
        assert_eq!(next.units, 6);
        assert_eq!(next.subsidized_loan_base, dec!(900000));
        assert_eq!(next.fundable_costs, Decimal::ZERO);
    }

    #[test]
    fn test_fundable_costs_capped_at_limit() {
        let input = ProjectionInput {
            units: 2,
            ..Default::default()
        };
        let next = apply_edit(&input, FieldEdit::FundableCosts(dec!(450000)));
        assert_eq!(next.subsidized_loan_base, dec!(300000));

        let below = apply_edit(&input, FieldEdit::FundableCosts(dec!(120000)));
        assert_eq!(below.subsidized_loan_base, dec!(120000));
    }

    #[test]
    fn test_zero_fundable_costs_keep_loan_base() {
        let input = ProjectionInput::default();
        let next = apply_edit(&input, FieldEdit::FundableCosts(Decimal::ZERO));
        assert_eq!(next.subsidized_loan_base, input.subsidized_loan_base);
    }

    #[test]
    fn test_manual_loan_base_clears_override() {
        let input = ProjectionInput {
            fundable_costs: dec!(99000),
            ..Default::default()
        };
        let next = apply_edit(&input, FieldEdit::SubsidizedLoanBase(dec!(80000)));
        assert_eq!(next.subsidized_loan_base, dec!(80000));
        assert_eq!(next.fundable_costs, Decimal::ZERO);
    }

    #[test]
    fn test_old_building_share() {
        assert_eq!(old_building_share_pct(dec!(80), dec!(8)).unwrap(), dec!(12));
        assert_eq!(old_building_share_pct(dec!(60), dec!(40)).unwrap(), Decimal::ZERO);
        assert!(old_building_share_pct(dec!(90), dec!(20)).is_err());
    }

    #[test]
    fn test_municipal_grant_factor() {
        assert_eq!(municipal_grant_from_funding(dec!(50000)), dec!(20000));
    }
}
