pub mod derive;
pub mod input;
pub mod normalize;

pub use derive::{apply_edit, subsidized_loan_limit, FieldEdit};
pub use input::{
    AcquisitionModel, ChurchTax, ProjectionHorizon, ProjectionInput, SubsidizedLoanType, TaxMode,
    TaxTable,
};
pub use normalize::{normalize_percentages, ProjectionParams, RepaymentRegime};
