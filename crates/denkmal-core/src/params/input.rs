use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DenkmalError;
use crate::params::derive::{old_building_share_pct, SUBSIDIZED_LOAN_LIMIT_PER_UNIT};
use crate::params::normalize::lenient_percent;
use crate::types::{Area, Money};
use crate::DenkmalResult;

/// Earliest tax year the rate assumptions are maintained for.
pub const MIN_TAX_YEAR: i32 = 2024;

/// Upper bound for amounts and financing totals (EUR).
pub const MAX_AMOUNT: Money = dec!(1000000000000);

/// Upper bound for living and cellar area (m²).
pub const MAX_AREA: Area = dec!(10000000);

/// Upper bound for per-unit and per-m² amounts (EUR).
pub const MAX_UNIT_AMOUNT: Money = dec!(1000000);

/// Upper bound for unit and parking-space counts.
pub const MAX_COUNT: u32 = 1_000_000;

/// Upper bound for growth rates (percent per year).
const MAX_GROWTH_PCT: Decimal = dec!(100);

/// How the acquisition is contracted. Decides which part of the net
/// investment bears incidental acquisition costs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionModel {
    /// One purchase contract over the whole net investment
    #[default]
    SingleContract,
    /// Purchase of the existing building plus a separate general-contractor
    /// agreement for the renovation; only the purchase bears incidental costs
    PurchaseAndContractor,
}

/// Repayment regime of the subsidized loan as selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsidizedLoanType {
    /// Grace period followed by an annuity
    #[default]
    Annuity,
    /// Interest only, full repayment at maturity
    Bullet,
}

/// Source of the marginal income tax rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// Derived from taxable income (flat placeholder rate, no bracket tables)
    #[default]
    TaxableIncome,
    /// User-supplied marginal rate
    ManualRate,
}

/// Income tax table. Carried for reporting only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxTable {
    #[default]
    Basic,
    Splitting,
}

/// Church tax surcharge on the income tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurchTax {
    None,
    /// Bavaria / Baden-Württemberg
    EightPercent,
    /// All other federal states
    #[default]
    NinePercent,
}

impl ChurchTax {
    pub fn rate(self) -> Decimal {
        match self {
            ChurchTax::None => Decimal::ZERO,
            ChurchTax::EightPercent => dec!(0.08),
            ChurchTax::NinePercent => dec!(0.09),
        }
    }
}

/// Length of the projection table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ProjectionHorizon {
    Years30,
    #[default]
    Years35,
}

impl ProjectionHorizon {
    pub fn years(self) -> u32 {
        match self {
            ProjectionHorizon::Years30 => 30,
            ProjectionHorizon::Years35 => 35,
        }
    }
}

impl TryFrom<u32> for ProjectionHorizon {
    type Error = String;

    fn try_from(years: u32) -> Result<Self, Self::Error> {
        match years {
            30 => Ok(ProjectionHorizon::Years30),
            35 => Ok(ProjectionHorizon::Years35),
            other => Err(format!("projection horizon must be 30 or 35 years, got {other}")),
        }
    }
}

impl From<ProjectionHorizon> for u32 {
    fn from(h: ProjectionHorizon) -> u32 {
        h.years()
    }
}

/// The flat parameter record supplied by the input surface.
///
/// Percent fields (`*_pct`) are in percent units and deserialize leniently:
/// anything that is not a number or numeric string becomes zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionInput {
    pub object_name: String,

    // --- Object ---
    /// Net investment base (purchase + renovation, before incidental costs)
    pub net_investment: Money,
    #[serde(deserialize_with = "lenient_percent")]
    pub renovation_share_pct: Decimal,
    #[serde(deserialize_with = "lenient_percent")]
    pub land_share_pct: Decimal,
    pub living_area: Area,
    pub units: u32,
    pub cellar_area: Area,
    pub parking_spaces: u32,

    // --- Grants and subsidized loan ---
    pub municipal_grant: Money,
    pub regional_grant: Money,
    /// Fundable costs override; zero means "use `subsidized_loan_base`"
    pub fundable_costs: Money,
    pub subsidized_loan_base: Money,
    pub supervision_cost_per_unit: Money,
    pub acquisition_model: AcquisitionModel,

    // --- Financing ---
    #[serde(deserialize_with = "lenient_percent")]
    pub equity_ratio_pct: Decimal,
    #[serde(deserialize_with = "lenient_percent")]
    pub bank_interest_pct: Decimal,
    #[serde(deserialize_with = "lenient_percent")]
    pub bank_amortization_pct: Decimal,
    pub subsidized_loan_type: SubsidizedLoanType,
    #[serde(deserialize_with = "lenient_percent")]
    pub subsidized_interest_pct: Decimal,
    pub subsidized_term_years: u32,
    pub subsidized_grace_years: u32,

    // --- Tax ---
    pub tax_mode: TaxMode,
    pub taxable_income: Money,
    #[serde(deserialize_with = "lenient_percent")]
    pub manual_tax_rate_pct: Decimal,
    pub tax_table: TaxTable,
    pub church_tax: ChurchTax,
    pub tax_year: i32,
    pub holding_period_years: u32,
    pub horizon_years: ProjectionHorizon,

    // --- Forecast ---
    #[serde(deserialize_with = "lenient_percent")]
    pub safety_margin_pct: Decimal,
    #[serde(deserialize_with = "lenient_percent")]
    pub rent_growth_pct: Decimal,
    #[serde(deserialize_with = "lenient_percent")]
    pub cost_growth_pct: Decimal,
    #[serde(deserialize_with = "lenient_percent")]
    pub value_growth_pct: Decimal,
    /// Administrative cost per unit and month
    pub admin_cost_per_unit: Money,
    /// Living-space rent per m² and month
    pub rent_per_sqm: Money,
    pub cellar_rent_per_sqm: Money,
    /// Rent per parking space and month
    pub parking_rent: Money,
}

impl Default for ProjectionInput {
    fn default() -> Self {
        ProjectionInput {
            object_name: String::new(),
            net_investment: Decimal::ZERO,
            renovation_share_pct: dec!(80.0),
            land_share_pct: dec!(8.0),
            living_area: Decimal::ZERO,
            units: 1,
            cellar_area: Decimal::ZERO,
            parking_spaces: 0,
            municipal_grant: Decimal::ZERO,
            regional_grant: Decimal::ZERO,
            fundable_costs: Decimal::ZERO,
            subsidized_loan_base: SUBSIDIZED_LOAN_LIMIT_PER_UNIT,
            supervision_cost_per_unit: dec!(3998),
            acquisition_model: AcquisitionModel::SingleContract,
            equity_ratio_pct: dec!(20.0),
            bank_interest_pct: dec!(4.20),
            bank_amortization_pct: dec!(2.00),
            subsidized_loan_type: SubsidizedLoanType::Annuity,
            subsidized_interest_pct: dec!(2.86),
            subsidized_term_years: 30,
            subsidized_grace_years: 4,
            tax_mode: TaxMode::TaxableIncome,
            taxable_income: dec!(100000),
            manual_tax_rate_pct: dec!(42.0),
            tax_table: TaxTable::Basic,
            church_tax: ChurchTax::NinePercent,
            tax_year: MIN_TAX_YEAR,
            holding_period_years: 10,
            horizon_years: ProjectionHorizon::Years35,
            safety_margin_pct: dec!(5.0),
            rent_growth_pct: dec!(2.0),
            cost_growth_pct: dec!(1.5),
            value_growth_pct: dec!(2.0),
            admin_cost_per_unit: dec!(30.00),
            rent_per_sqm: dec!(10.50),
            cellar_rent_per_sqm: dec!(4.00),
            parking_rent: dec!(40.00),
        }
    }
}

impl ProjectionInput {
    /// Reject records the engine must never see. Run before any calculation.
    ///
    /// Every bound is fixed, so the outcome depends on the record alone. The
    /// upper tax-year bound depends on the calendar and is checked by the
    /// caller through [`ProjectionInput::validate_tax_year`].
    pub fn validate(&self) -> DenkmalResult<()> {
        old_building_share_pct(self.renovation_share_pct, self.land_share_pct)?;

        let bounded = [
            ("net_investment", self.net_investment, MAX_AMOUNT),
            ("renovation_share_pct", self.renovation_share_pct, Decimal::ONE_HUNDRED),
            ("land_share_pct", self.land_share_pct, Decimal::ONE_HUNDRED),
            ("living_area", self.living_area, MAX_AREA),
            ("cellar_area", self.cellar_area, MAX_AREA),
            ("municipal_grant", self.municipal_grant, MAX_AMOUNT),
            ("regional_grant", self.regional_grant, MAX_AMOUNT),
            ("fundable_costs", self.fundable_costs, MAX_AMOUNT),
            ("subsidized_loan_base", self.subsidized_loan_base, MAX_AMOUNT),
            ("supervision_cost_per_unit", self.supervision_cost_per_unit, MAX_UNIT_AMOUNT),
            ("equity_ratio_pct", self.equity_ratio_pct, Decimal::ONE_HUNDRED),
            ("bank_interest_pct", self.bank_interest_pct, Decimal::ONE_HUNDRED),
            ("bank_amortization_pct", self.bank_amortization_pct, Decimal::ONE_HUNDRED),
            ("subsidized_interest_pct", self.subsidized_interest_pct, Decimal::ONE_HUNDRED),
            ("taxable_income", self.taxable_income, MAX_AMOUNT),
            ("manual_tax_rate_pct", self.manual_tax_rate_pct, Decimal::ONE_HUNDRED),
            ("safety_margin_pct", self.safety_margin_pct, Decimal::ONE_HUNDRED),
            ("admin_cost_per_unit", self.admin_cost_per_unit, MAX_UNIT_AMOUNT),
            ("rent_per_sqm", self.rent_per_sqm, MAX_UNIT_AMOUNT),
            ("cellar_rent_per_sqm", self.cellar_rent_per_sqm, MAX_UNIT_AMOUNT),
            ("parking_rent", self.parking_rent, MAX_UNIT_AMOUNT),
        ];
        for (field, value, max) in bounded {
            if value < Decimal::ZERO {
                return Err(DenkmalError::invalid(field, "must not be negative"));
            }
            if value > max {
                return Err(DenkmalError::invalid(field, format!("must not exceed {max}")));
            }
        }

        // Growth rates may be negative, but not below -100%
        for (field, value) in [
            ("rent_growth_pct", self.rent_growth_pct),
            ("cost_growth_pct", self.cost_growth_pct),
            ("value_growth_pct", self.value_growth_pct),
        ] {
            if value <= dec!(-100) {
                return Err(DenkmalError::invalid(field, "growth must be above -100%"));
            }
            if value > MAX_GROWTH_PCT {
                return Err(DenkmalError::invalid(
                    field,
                    format!("growth must not exceed {MAX_GROWTH_PCT}%"),
                ));
            }
        }

        for (field, count) in [("units", self.units), ("parking_spaces", self.parking_spaces)] {
            if count > MAX_COUNT {
                return Err(DenkmalError::invalid(field, format!("must not exceed {MAX_COUNT}")));
            }
        }

        if self.subsidized_term_years == 0 {
            return Err(DenkmalError::invalid(
                "subsidized_term_years",
                "loan term must be at least 1 year",
            ));
        }
        if self.holding_period_years == 0 {
            return Err(DenkmalError::invalid(
                "holding_period_years",
                "holding period must be at least 1 year",
            ));
        }

        if self.tax_year < MIN_TAX_YEAR {
            return Err(DenkmalError::invalid(
                "tax_year",
                format!("tax year must not be before {MIN_TAX_YEAR}"),
            ));
        }

        Ok(())
    }

    /// Check the tax year against `MIN_TAX_YEAR ..= latest_tax_year`.
    /// Callers pass the current calendar year + 1.
    pub fn validate_tax_year(&self, latest_tax_year: i32) -> DenkmalResult<()> {
        if self.tax_year < MIN_TAX_YEAR || self.tax_year > latest_tax_year {
            return Err(DenkmalError::invalid(
                "tax_year",
                format!("tax year must be between {MIN_TAX_YEAR} and {latest_tax_year}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ProjectionInput::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let input: ProjectionInput =
            serde_json::from_str(r#"{"net_investment": "500000", "units": 4}"#).unwrap();
        assert_eq!(input.net_investment, dec!(500000));
        assert_eq!(input.units, 4);
        assert_eq!(input.equity_ratio_pct, dec!(20.0));
        assert_eq!(input.horizon_years, ProjectionHorizon::Years35);
    }

    #[test]
    fn test_garbage_percent_degrades_to_zero() {
        let input: ProjectionInput = serde_json::from_str(
            r#"{"equity_ratio_pct": "abc", "bank_interest_pct": null, "rent_growth_pct": "2.5"}"#,
        )
        .unwrap();
        assert_eq!(input.equity_ratio_pct, Decimal::ZERO);
        assert_eq!(input.bank_interest_pct, Decimal::ZERO);
        assert_eq!(input.rent_growth_pct, dec!(2.5));
    }

    #[test]
    fn test_share_sum_above_100_rejected() {
        let input = ProjectionInput {
            renovation_share_pct: dec!(85),
            land_share_pct: dec!(20),
            ..Default::default()
        };
        assert!(matches!(
            input.validate(),
            Err(DenkmalError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_share_sum_exactly_100_accepted() {
        let input = ProjectionInput {
            renovation_share_pct: dec!(90),
            land_share_pct: dec!(10),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let input = ProjectionInput {
            municipal_grant: dec!(-1),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_zero_term_rejected() {
        let input = ProjectionInput {
            subsidized_term_years: 0,
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_tax_year_before_minimum_rejected() {
        let input = ProjectionInput {
            tax_year: 2023,
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_tax_year_upper_bound_supplied_by_caller() {
        let input = ProjectionInput {
            tax_year: 2030,
            ..Default::default()
        };
        // The record alone carries no calendar bound
        assert!(input.validate().is_ok());
        assert!(input.validate_tax_year(2030).is_ok());
        assert!(matches!(
            input.validate_tax_year(2027),
            Err(DenkmalError::InvalidInput { .. })
        ));
        assert!(ProjectionInput::default().validate_tax_year(2025).is_ok());
    }

    #[test]
    fn test_amount_above_bound_rejected() {
        let input = ProjectionInput {
            net_investment: Decimal::from_scientific("7e28").unwrap(),
            ..Default::default()
        };
        match input.validate() {
            Err(DenkmalError::InvalidInput { field, .. }) => assert_eq!(field, "net_investment"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }

        let at_bound = ProjectionInput {
            net_investment: MAX_AMOUNT,
            ..Default::default()
        };
        assert!(at_bound.validate().is_ok());
    }

    #[test]
    fn test_rates_counts_and_growth_bounded() {
        let interest = ProjectionInput {
            bank_interest_pct: dec!(150),
            ..Default::default()
        };
        assert!(interest.validate().is_err());

        let growth = ProjectionInput {
            rent_growth_pct: dec!(100.01),
            ..Default::default()
        };
        assert!(growth.validate().is_err());

        let units = ProjectionInput {
            units: MAX_COUNT + 1,
            ..Default::default()
        };
        assert!(units.validate().is_err());

        let rent = ProjectionInput {
            rent_per_sqm: MAX_UNIT_AMOUNT + Decimal::ONE,
            ..Default::default()
        };
        assert!(rent.validate().is_err());
    }

    #[test]
    fn test_horizon_must_be_30_or_35() {
        let ok: ProjectionInput = serde_json::from_str(r#"{"horizon_years": 30}"#).unwrap();
        assert_eq!(ok.horizon_years.years(), 30);
        assert!(serde_json::from_str::<ProjectionInput>(r#"{"horizon_years": 40}"#).is_err());
    }
}
