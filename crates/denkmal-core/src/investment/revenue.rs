use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::params::normalize::ProjectionParams;
use crate::types::Money;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Year-1 rent, haircut and administrative cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueResult {
    pub monthly_living_rent: Money,
    pub monthly_cellar_rent: Money,
    pub monthly_parking_rent: Money,
    pub monthly_rent_total: Money,
    pub annual_cold_rent: Money,
    /// Vacancy / rent-loss haircut
    pub safety_haircut: Money,
    pub net_annual_rent: Money,
    pub annual_admin_cost: Money,
    /// Net rent minus administrative cost
    pub income_surplus: Money,
}

pub fn calculate_revenue(params: &ProjectionParams) -> RevenueResult {
    let monthly_living_rent = params.living_area * params.rent_per_sqm;
    let monthly_cellar_rent = params.cellar_area * params.cellar_rent_per_sqm;
    let monthly_parking_rent = Decimal::from(params.parking_spaces) * params.parking_rent;
    let monthly_rent_total = monthly_living_rent + monthly_cellar_rent + monthly_parking_rent;

    let annual_cold_rent = monthly_rent_total * MONTHS_PER_YEAR;
    let safety_haircut = annual_cold_rent * params.safety_margin;
    let net_annual_rent = annual_cold_rent - safety_haircut;
    let annual_admin_cost =
        params.admin_cost_per_unit * Decimal::from(params.units) * MONTHS_PER_YEAR;

    RevenueResult {
        monthly_living_rent,
        monthly_cellar_rent,
        monthly_parking_rent,
        monthly_rent_total,
        annual_cold_rent,
        safety_haircut,
        net_annual_rent,
        annual_admin_cost,
        income_surplus: net_annual_rent - annual_admin_cost,
    }
}
