pub mod acquisition;
pub mod revenue;

pub use acquisition::{calculate_investment, InvestmentResult};
pub use revenue::{calculate_revenue, RevenueResult};
