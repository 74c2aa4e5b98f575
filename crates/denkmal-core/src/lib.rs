pub mod error;
pub mod time_value;
pub mod types;

pub mod params;

pub mod investment;

pub mod financing;

pub mod depreciation;

pub mod projection;

pub mod kpi;

pub use error::DenkmalError;
pub use projection::engine::run_projection;
pub use types::*;

/// Standard result type for all projection operations
pub type DenkmalResult<T> = Result<T, DenkmalError>;
