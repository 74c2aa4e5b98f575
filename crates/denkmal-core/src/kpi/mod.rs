pub mod irr;
pub mod metrics;

pub use irr::{calculate_irr, Irr};
pub use metrics::{calculate_kpis, KpiBundle, ReturnOnEquity};
