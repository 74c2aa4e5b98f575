pub mod schedule;

pub use schedule::{build_depreciation_schedule, DepreciationSchedule, DepreciationYear};
