use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values (EUR). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Floor areas in square metres
pub type Area = Decimal;

/// Soft conditions recorded next to a result. Never raised as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Requested subsidized-loan base exceeded `units × per-unit limit`
    SubsidizedLoanBaseLimited { requested: Money, limit: Money },
    /// Subsidized loan (base + supervision cost) exceeded the debt requirement
    SubsidizedLoanCapped { requested: Money, capped: Money },
    /// Grants targeting the renovation spend exceed its depreciation basis
    GrantsExceedRenovationBasis { basis: Money, grants: Money },
    /// Old-building share below 5% of the net investment
    LowOldBuildingShare { share: Rate },
    /// Holding period longer than the projection table
    HoldingPeriodTruncated { requested: u32, used: u32 },
    /// IRR solver ran but did not converge
    IrrNotConverged { reason: String },
    /// IRR undefined for the cash-flow stream
    IrrUnavailable { reason: String },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::SubsidizedLoanBaseLimited { requested, limit } => write!(
                f,
                "Subsidized loan base {requested} exceeds the per-unit limit; limited to {limit}"
            ),
            Advisory::SubsidizedLoanCapped { requested, capped } => write!(
                f,
                "Subsidized loan {requested} exceeded the debt requirement; capped to {capped}"
            ),
            Advisory::GrantsExceedRenovationBasis { basis, grants } => write!(
                f,
                "Grants of {grants} exceed the renovation depreciation basis of {basis}; basis floored at 0"
            ),
            Advisory::LowOldBuildingShare { share } => write!(
                f,
                "Old-building share of {:.2}% is very low",
                share * Decimal::ONE_HUNDRED
            ),
            Advisory::HoldingPeriodTruncated { requested, used } => write!(
                f,
                "Holding period of {requested} years exceeds the projection; using {used} years"
            ),
            Advisory::IrrNotConverged { reason } => write!(f, "IRR did not converge: {reason}"),
            Advisory::IrrUnavailable { reason } => write!(f, "IRR not available: {reason}"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Render advisories into the envelope's warning strings.
pub fn advisory_warnings(advisories: &[Advisory]) -> Vec<String> {
    advisories.iter().map(ToString::to_string).collect()
}
