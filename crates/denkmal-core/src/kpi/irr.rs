use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DenkmalError;
use crate::time_value;
use crate::types::{Money, Rate};

const IRR_GUESS: Rate = dec!(0.05);

/// Outcome of the IRR solver. A failed solve is reported, never silently zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Irr {
    Converged { rate: Rate },
    /// The solver ran on a valid stream but found no root
    NotConverged { reason: String },
    /// Too few flows or no sign change: IRR is undefined
    Unavailable { reason: String },
}

impl Irr {
    pub fn rate(&self) -> Option<Rate> {
        match self {
            Irr::Converged { rate } => Some(*rate),
            _ => None,
        }
    }

    /// Converged rate, 0 otherwise.
    pub fn rate_or_zero(&self) -> Rate {
        self.rate().unwrap_or(Decimal::ZERO)
    }
}

/// IRR of an investor cash-flow stream `[-equity, cf_1, …, cf_h + exit]`.
pub fn calculate_irr(cash_flows: &[Money]) -> Irr {
    match time_value::irr(cash_flows, IRR_GUESS) {
        Ok(rate) => Irr::Converged { rate },
        Err(DenkmalError::InsufficientData(reason)) => Irr::Unavailable { reason },
        Err(e) => {
            log::warn!("IRR solver failed: {e}");
            Irr::NotConverged {
                reason: e.to_string(),
            }
        }
    }
}

/// Investor cash flows over the holding period: equity out at t=0, post-tax
/// cash flows in, exit proceeds added to the final year.
pub fn investor_cash_flows(equity: Money, post_tax: &[Money], exit_proceeds: Money) -> Vec<Money> {
    let mut flows = Vec::with_capacity(post_tax.len() + 1);
    flows.push(-equity);
    flows.extend_from_slice(post_tax);
    if let Some(last) = flows.last_mut().filter(|_| !post_tax.is_empty()) {
        *last += exit_proceeds;
    }
    flows
}
