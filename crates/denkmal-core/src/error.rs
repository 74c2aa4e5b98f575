use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DenkmalError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Computation failed in {stage}: {reason}")]
    ComputationFailed { stage: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DenkmalError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        DenkmalError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DenkmalError {
    fn from(e: serde_json::Error) -> Self {
        DenkmalError::SerializationError(e.to_string())
    }
}
