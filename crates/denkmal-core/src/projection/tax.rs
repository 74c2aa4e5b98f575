use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::params::input::TaxMode;
use crate::params::normalize::ProjectionParams;
use crate::types::Rate;

/// Solidarity surcharge on the income tax
pub const SOLIDARITY_RATE: Rate = dec!(0.055);
/// Flat marginal rate used when the rate is derived from taxable income
pub const PLACEHOLDER_MARGINAL_RATE: Rate = dec!(0.42);

/// Marginal tax rates applied to the yearly taxable result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    /// Income tax only
    pub net_marginal_rate: Rate,
    pub solidarity_rate: Rate,
    pub church_rate: Rate,
    /// `net × (1 + solidarity + church)`
    pub gross_rate: Rate,
}

/// Resolve the marginal rates once per run.
///
/// No bracket tables: in `TaxableIncome` mode the flat 42% placeholder applies
/// and taxable income and table choice are carried for display only.
pub fn tax_rates(params: &ProjectionParams) -> TaxRates {
    let net_marginal_rate = match params.tax_mode {
        TaxMode::ManualRate => params.manual_tax_rate,
        TaxMode::TaxableIncome => PLACEHOLDER_MARGINAL_RATE,
    };
    let church_rate = params.church_tax.rate();

    TaxRates {
        net_marginal_rate,
        solidarity_rate: SOLIDARITY_RATE,
        church_rate,
        gross_rate: net_marginal_rate * (Decimal::ONE + SOLIDARITY_RATE + church_rate),
    }
}
