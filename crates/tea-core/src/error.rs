use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TeaError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unsupported depreciation schedule: {0} (expected \"linear\" or a list of fractions)")]
    UnsupportedDepreciationSchedule(String),

    #[error(
        "Cannot solve {quantity}; objective function for NPV = {target} at bounds {lower_bound} \
         and {upper_bound} does not have opposite signs ({objective_at_lower} and {objective_at_upper})"
    )]
    BracketFailure {
        quantity: String,
        target: Decimal,
        lower_bound: Decimal,
        upper_bound: Decimal,
        objective_at_lower: Decimal,
        objective_at_upper: Decimal,
    },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TeaError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        TeaError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TeaError {
    fn from(e: serde_json::Error) -> Self {
        TeaError::SerializationError(e.to_string())
    }
}
