use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Statutory rates
// ---------------------------------------------------------------------------

/// Special band on listed-building renovation spend, years 1–8
pub const SPECIAL_RATE_EARLY: Rate = dec!(0.09);
/// Special band, years 9–12
pub const SPECIAL_RATE_LATE: Rate = dec!(0.07);
pub const SPECIAL_EARLY_YEARS: u32 = 8;
pub const SPECIAL_LAST_YEAR: u32 = 12;
/// Straight-line rate on the old-building basis
pub const STRAIGHT_LINE_RATE: Rate = dec!(0.02);

/// Depreciation of one year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationYear {
    pub year: u32,
    pub special: Money,
    pub straight_line: Money,
    pub total: Money,
    pub renovation_remaining: Money,
    pub old_building_remaining: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationSchedule {
    pub renovation_basis: Money,
    pub old_building_basis: Money,
    pub years: Vec<DepreciationYear>,
    pub total_special: Money,
    pub total_straight_line: Money,
}

/// Special-band rate for a 1-based year; zero after year 12.
pub fn special_rate(year: u32) -> Rate {
    match year {
        1..=SPECIAL_EARLY_YEARS => SPECIAL_RATE_EARLY,
        y if y <= SPECIAL_LAST_YEAR && y > SPECIAL_EARLY_YEARS => SPECIAL_RATE_LATE,
        _ => Decimal::ZERO,
    }
}

/// Build the two depreciation bands. Neither band ever depreciates more than
/// what is left of its basis.
pub fn build_depreciation_schedule(
    renovation_basis: Money,
    old_building_basis: Money,
    years: u32,
) -> DepreciationSchedule {
    let renovation_basis = renovation_basis.max(Decimal::ZERO);
    let old_building_basis = old_building_basis.max(Decimal::ZERO);
    let straight_line_amount = old_building_basis * STRAIGHT_LINE_RATE;

    let mut renovation_remaining = renovation_basis;
    let mut old_building_remaining = old_building_basis;
    let mut rows = Vec::with_capacity(years as usize);

    for year in 1..=years {
        let special = (renovation_basis * special_rate(year)).min(renovation_remaining);
        let straight_line = straight_line_amount.min(old_building_remaining);
        renovation_remaining -= special;
        old_building_remaining -= straight_line;

        rows.push(DepreciationYear {
            year,
            special,
            straight_line,
            total: special + straight_line,
            renovation_remaining,
            old_building_remaining,
        });
    }

    DepreciationSchedule {
        renovation_basis,
        old_building_basis,
        total_special: rows.iter().map(|r| r.special).sum(),
        total_straight_line: rows.iter().map(|r| r.straight_line).sum(),
        years: rows,
    }
}
