pub mod cash_flow;
pub mod engine;
pub mod tax;

pub use cash_flow::{synthesize_years, YearRow};
pub use engine::{
    run_depreciation, run_financing, run_investment, run_projection, InvestmentOutput,
    ProjectionOutput,
};
pub use tax::{tax_rates, TaxRates};
