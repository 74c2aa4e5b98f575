pub mod bank_loan;
pub mod schedule;
pub mod subsidized_loan;

pub use bank_loan::build_bank_schedule;
pub use schedule::{
    build_financing_schedule, FinancingSchedule, FinancingYear, LoanPeriod, LoanSchedule,
};
pub use subsidized_loan::build_subsidized_schedule;
