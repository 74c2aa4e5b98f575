use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::params::input::{
    AcquisitionModel, ChurchTax, ProjectionHorizon, ProjectionInput, SubsidizedLoanType, TaxMode,
    TaxTable,
};
use crate::types::{Area, Money, Rate};

/// Suffix marking percent-unit keys in a flat parameter mapping.
pub const PERCENT_SUFFIX: &str = "_pct";

/// Repayment regime of the subsidized loan, carrying its own parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepaymentRegime {
    /// Interest-only grace period, then an annuity over the remaining term
    Annuity { grace_years: u32 },
    /// Interest only for the full term, balance due at maturity
    Bullet,
}

/// Parameter record with every percentage converted to a decimal fraction.
/// Immutable for the duration of one projection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    pub object_name: String,
    pub net_investment: Money,
    pub renovation_share: Rate,
    pub land_share: Rate,
    /// Derived: `max(0, 1 - renovation_share - land_share)`
    pub old_building_share: Rate,
    pub living_area: Area,
    pub units: u32,
    pub cellar_area: Area,
    pub parking_spaces: u32,
    pub municipal_grant: Money,
    pub regional_grant: Money,
    pub fundable_costs: Money,
    pub subsidized_loan_base: Money,
    pub supervision_cost_per_unit: Money,
    pub acquisition_model: AcquisitionModel,
    pub equity_ratio: Rate,
    pub bank_interest: Rate,
    pub bank_amortization: Rate,
    pub subsidized_interest: Rate,
    pub subsidized_term_years: u32,
    pub repayment_regime: RepaymentRegime,
    pub tax_mode: TaxMode,
    pub taxable_income: Money,
    pub manual_tax_rate: Rate,
    pub tax_table: TaxTable,
    pub church_tax: ChurchTax,
    pub tax_year: i32,
    pub holding_period_years: u32,
    pub horizon: ProjectionHorizon,
    pub safety_margin: Rate,
    pub rent_growth: Rate,
    pub cost_growth: Rate,
    pub value_growth: Rate,
    pub admin_cost_per_unit: Money,
    pub rent_per_sqm: Money,
    pub cellar_rent_per_sqm: Money,
    pub parking_rent: Money,
}

/// Convert a percent-unit value to a fraction (20 -> 0.20).
pub fn percent_to_fraction(value: Decimal) -> Rate {
    value / Decimal::ONE_HUNDRED
}

impl ProjectionInput {
    /// Convert percent-unit fields to fractions and resolve the configuration switches.
    pub fn normalize(&self) -> ProjectionParams {
        let renovation_share = percent_to_fraction(self.renovation_share_pct);
        let land_share = percent_to_fraction(self.land_share_pct);
        let old_building_share = (Decimal::ONE - renovation_share - land_share).max(Decimal::ZERO);

        let repayment_regime = match self.subsidized_loan_type {
            SubsidizedLoanType::Annuity => RepaymentRegime::Annuity {
                grace_years: self.subsidized_grace_years,
            },
            SubsidizedLoanType::Bullet => RepaymentRegime::Bullet,
        };

        ProjectionParams {
            object_name: self.object_name.clone(),
            net_investment: self.net_investment,
            renovation_share,
            land_share,
            old_building_share,
            living_area: self.living_area,
            units: self.units,
            cellar_area: self.cellar_area,
            parking_spaces: self.parking_spaces,
            municipal_grant: self.municipal_grant,
            regional_grant: self.regional_grant,
            fundable_costs: self.fundable_costs,
            subsidized_loan_base: self.subsidized_loan_base,
            supervision_cost_per_unit: self.supervision_cost_per_unit,
            acquisition_model: self.acquisition_model,
            equity_ratio: percent_to_fraction(self.equity_ratio_pct),
            bank_interest: percent_to_fraction(self.bank_interest_pct),
            bank_amortization: percent_to_fraction(self.bank_amortization_pct),
            subsidized_interest: percent_to_fraction(self.subsidized_interest_pct),
            subsidized_term_years: self.subsidized_term_years,
            repayment_regime,
            tax_mode: self.tax_mode,
            taxable_income: self.taxable_income,
            manual_tax_rate: percent_to_fraction(self.manual_tax_rate_pct),
            tax_table: self.tax_table,
            church_tax: self.church_tax,
            tax_year: self.tax_year,
            holding_period_years: self.holding_period_years,
            horizon: self.horizon_years,
            safety_margin: percent_to_fraction(self.safety_margin_pct),
            rent_growth: percent_to_fraction(self.rent_growth_pct),
            cost_growth: percent_to_fraction(self.cost_growth_pct),
            value_growth: percent_to_fraction(self.value_growth_pct),
            admin_cost_per_unit: self.admin_cost_per_unit,
            rent_per_sqm: self.rent_per_sqm,
            cellar_rent_per_sqm: self.cellar_rent_per_sqm,
            parking_rent: self.parking_rent,
        }
    }
}

/// Normalize a flat parameter mapping: every `*_pct` key gets a sibling without
/// the suffix holding the value as a fraction. Original keys are kept.
///
/// Missing, null or non-numeric values normalize to `0` instead of failing.
pub fn normalize_percentages(params: &Map<String, Value>) -> Map<String, Value> {
    let mut normalized = params.clone();
    for (key, value) in params {
        if let Some(stem) = key.strip_suffix(PERCENT_SUFFIX) {
            let fraction = percent_to_fraction(decimal_from_value(value));
            normalized.insert(stem.to_string(), Value::String(fraction.normalize().to_string()));
        }
    }
    normalized
}

/// Best-effort numeric reading of a JSON value; anything unreadable is zero.
pub fn decimal_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => Decimal::ZERO,
    }
}

fn parse_decimal(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// Serde adapter for percent fields: numbers and numeric strings are read,
/// everything else becomes zero.
pub(crate) fn lenient_percent<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal_from_value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_normalize_strips_suffix_and_scales() {
        let map = json!({ "equity_ratio_pct": 20, "bank_interest_pct": "4.2", "units": 6 });
        let normalized = normalize_percentages(map.as_object().unwrap());

        assert_eq!(normalized["equity_ratio"], json!("0.2"));
        assert_eq!(normalized["bank_interest"], json!("0.042"));
        // Non-percent keys and originals survive untouched
        assert_eq!(normalized["units"], json!(6));
        assert_eq!(normalized["equity_ratio_pct"], json!(20));
    }

    #[test]
    fn test_normalize_non_numeric_is_zero() {
        let map = json!({ "a_pct": "n/a", "b_pct": null, "c_pct": "" , "d_pct": [1]});
        let normalized = normalize_percentages(map.as_object().unwrap());
        for key in ["a", "b", "c", "d"] {
            assert_eq!(normalized[key], json!("0"), "key {key}");
        }
    }

    #[test]
    fn test_decimal_from_value_scientific() {
        assert_eq!(decimal_from_value(&json!("1e-2")), dec!(0.01));
        assert_eq!(decimal_from_value(&json!(" 7.5 ")), dec!(7.5));
    }

    #[test]
    fn test_typed_normalize() {
        let params = ProjectionInput::default().normalize();
        assert_eq!(params.renovation_share, dec!(0.80));
        assert_eq!(params.land_share, dec!(0.08));
        assert_eq!(params.old_building_share, dec!(0.12));
        assert_eq!(params.equity_ratio, dec!(0.20));
        assert_eq!(params.bank_interest, dec!(0.042));
        assert_eq!(params.subsidized_interest, dec!(0.0286));
        assert_eq!(
            params.repayment_regime,
            RepaymentRegime::Annuity { grace_years: 4 }
        );
    }

    #[test]
    fn test_bullet_regime_drops_grace_period() {
        let input = ProjectionInput {
            subsidized_loan_type: SubsidizedLoanType::Bullet,
            subsidized_grace_years: 7,
            ..Default::default()
        };
        assert_eq!(input.normalize().repayment_regime, RepaymentRegime::Bullet);
    }

    #[test]
    fn test_old_building_share_floors_at_zero() {
        let input = ProjectionInput {
            renovation_share_pct: dec!(95),
            land_share_pct: dec!(5.00005),
            ..Default::default()
        };
        assert_eq!(input.normalize().old_building_share, Decimal::ZERO);
    }
}
