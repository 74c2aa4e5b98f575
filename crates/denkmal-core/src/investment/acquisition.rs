use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::params::derive::{requested_loan_base, subsidized_loan_limit};
use crate::params::input::AcquisitionModel;
use crate::params::normalize::ProjectionParams;
use crate::types::{Advisory, Money, Rate};

// ---------------------------------------------------------------------------
// Statutory constants
// ---------------------------------------------------------------------------

/// Real-estate transfer tax
pub const TRANSFER_TAX_RATE: Rate = dec!(0.05);
/// Notary and land-registry fees
pub const NOTARY_RATE: Rate = dec!(0.015);
/// Incidental acquisition costs in total (6.5%)
pub const INCIDENTAL_COST_RATE: Rate = dec!(0.065);
/// Share of the construction-supervision cost paid back as a grant
pub const SUPERVISION_GRANT_RATE: Rate = dec!(0.50);
/// Repayment grant on the subsidized-loan base
pub const REPAYMENT_GRANT_RATE: Rate = dec!(0.40);
/// Old-building share below which an advisory is recorded
pub const LOW_OLD_BUILDING_SHARE: Rate = dec!(0.05);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cost values, depreciation bases, financing split and grants of one acquisition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub net_investment: Money,
    pub incidental_costs: Money,
    /// Net base plus incidental costs ("GIK brutto")
    pub gross_total: Money,
    /// Gross total plus construction supervision
    pub total_investment: Money,

    pub supervision_cost_total: Money,
    pub supervision_grant: Money,
    pub supervision_capitalized: Money,

    pub land_value: Money,
    pub renovation_value: Money,
    pub old_building_value: Money,
    pub land_basis: Money,
    pub renovation_basis_before_grants: Money,
    /// Special-depreciation basis after grant reductions, floored at 0
    pub renovation_basis: Money,
    /// Straight-line basis
    pub old_building_basis: Money,

    pub equity: Money,
    pub debt: Money,
    pub bank_loan: Money,
    /// Subsidized-loan base after the per-unit limit and the debt cap
    pub subsidized_loan_base: Money,
    /// Part of the supervision cost financed through the subsidized loan
    pub subsidized_supervision_financed: Money,
    pub subsidized_loan_total: Money,

    pub repayment_grant: Money,
    pub municipal_grant: Money,
    pub regional_grant: Money,
    pub total_grant: Money,
    /// `max(0, equity - total_grant)`
    pub effective_equity: Money,
}

/// Subsidized-loan split after limiting and capping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubsidizedLoanStructure {
    pub base: Money,
    pub supervision_financed: Money,
}

impl SubsidizedLoanStructure {
    pub fn total(&self) -> Money {
        self.base + self.supervision_financed
    }
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Derive acquisition costs, depreciation bases and the financing split.
///
/// Soft conditions (loan limiting and capping, grants exceeding the renovation
/// basis, a very low old-building share) are pushed onto `advisories`.
pub fn calculate_investment(
    params: &ProjectionParams,
    advisories: &mut Vec<Advisory>,
) -> InvestmentResult {
    let net = params.net_investment;
    let units = Decimal::from(params.units);

    // Construction supervision
    let supervision_cost_total = units * params.supervision_cost_per_unit;
    let supervision_grant = supervision_cost_total * SUPERVISION_GRANT_RATE;
    let supervision_capitalized = supervision_cost_total - supervision_grant;

    // Cost values
    let land_value = net * params.land_share;
    let renovation_value = net * params.renovation_share;
    let old_building_value = net * params.old_building_share;

    let (incidental_costs, land_basis, renovation_incidental, old_building_basis) =
        match params.acquisition_model {
            AcquisitionModel::SingleContract => {
                let gross_up = Decimal::ONE + INCIDENTAL_COST_RATE;
                (
                    net * INCIDENTAL_COST_RATE,
                    land_value * gross_up,
                    renovation_value * INCIDENTAL_COST_RATE,
                    old_building_value * gross_up,
                )
            }
            AcquisitionModel::PurchaseAndContractor => {
                let purchase_value = land_value + old_building_value;
                let incidental = purchase_value * INCIDENTAL_COST_RATE;
                let (land_incidental, old_incidental) = if purchase_value > Decimal::ZERO {
                    let land_part = incidental * land_value / purchase_value;
                    (land_part, incidental - land_part)
                } else {
                    (Decimal::ZERO, Decimal::ZERO)
                };
                (
                    incidental,
                    land_value + land_incidental,
                    Decimal::ZERO,
                    old_building_value + old_incidental,
                )
            }
        };

    let gross_total = net + incidental_costs;
    let total_investment = gross_total + supervision_cost_total;
    let renovation_basis_before_grants =
        renovation_value + renovation_incidental + supervision_capitalized;

    // Financing split
    let equity = total_investment * params.equity_ratio;
    let debt = total_investment - equity;

    let requested = requested_loan_base(params.fundable_costs, params.subsidized_loan_base);
    let limited = limit_subsidized_loan_base(requested, params.units, advisories);
    let structure = cap_subsidized_loan(limited, supervision_cost_total, debt, advisories);
    let subsidized_loan_total = structure.total();
    let bank_loan = (debt - subsidized_loan_total).max(Decimal::ZERO);

    // Grants
    let repayment_grant = repayment_grant(structure.base);
    let municipal_grant = params.municipal_grant;
    let regional_grant = params.regional_grant;
    let total_grant = repayment_grant + supervision_grant + municipal_grant + regional_grant;

    let basis_grants = repayment_grant + municipal_grant + regional_grant;
    if renovation_basis_before_grants > Decimal::ZERO
        && basis_grants > renovation_basis_before_grants
    {
        log::warn!(
            "grants {basis_grants} exceed renovation basis {renovation_basis_before_grants}"
        );
        advisories.push(Advisory::GrantsExceedRenovationBasis {
            basis: renovation_basis_before_grants,
            grants: basis_grants,
        });
    }
    let renovation_basis = (renovation_basis_before_grants - basis_grants).max(Decimal::ZERO);

    if net > Decimal::ZERO && params.old_building_share < LOW_OLD_BUILDING_SHARE {
        advisories.push(Advisory::LowOldBuildingShare {
            share: params.old_building_share,
        });
    }

    InvestmentResult {
        net_investment: net,
        incidental_costs,
        gross_total,
        total_investment,
        supervision_cost_total,
        supervision_grant,
        supervision_capitalized,
        land_value,
        renovation_value,
        old_building_value,
        land_basis,
        renovation_basis_before_grants,
        renovation_basis,
        old_building_basis,
        equity,
        debt,
        bank_loan,
        subsidized_loan_base: structure.base,
        subsidized_supervision_financed: structure.supervision_financed,
        subsidized_loan_total,
        repayment_grant,
        municipal_grant,
        regional_grant,
        total_grant,
        effective_equity: (equity - total_grant).max(Decimal::ZERO),
    }
}

/// Limit a requested subsidized-loan base to `units × 150,000`.
pub fn limit_subsidized_loan_base(
    requested: Money,
    units: u32,
    advisories: &mut Vec<Advisory>,
) -> Money {
    let limit = subsidized_loan_limit(units);
    if requested > limit {
        log::warn!("subsidized loan base {requested} limited to {limit}");
        advisories.push(Advisory::SubsidizedLoanBaseLimited { requested, limit });
        limit
    } else {
        requested
    }
}

/// Cap base + supervision cost to the available debt. The excess comes off
/// the base first, then off the financed supervision cost.
pub fn cap_subsidized_loan(
    base: Money,
    supervision_cost: Money,
    debt: Money,
    advisories: &mut Vec<Advisory>,
) -> SubsidizedLoanStructure {
    let requested = base + supervision_cost;
    let available = debt.max(Decimal::ZERO);
    if requested <= available {
        return SubsidizedLoanStructure {
            base,
            supervision_financed: supervision_cost,
        };
    }

    let excess = requested - available;
    let base_cut = excess.min(base);
    let supervision_cut = (excess - base_cut).min(supervision_cost);

    log::warn!("subsidized loan {requested} capped to debt requirement {available}");
    advisories.push(Advisory::SubsidizedLoanCapped {
        requested,
        capped: available,
    });

    SubsidizedLoanStructure {
        base: base - base_cut,
        supervision_financed: supervision_cost - supervision_cut,
    }
}

/// Repayment grant earned on a subsidized-loan base (40%).
pub fn repayment_grant(loan_base: Money) -> Money {
    loan_base * REPAYMENT_GRANT_RATE
}
