pub mod error;
pub mod solver;
pub mod time_value;
pub mod types;

#[cfg(feature = "cash_flow")]
pub mod cash_flow;

pub use error::TeaError;
pub use types::*;

/// Standard result type for all techno-economic operations
pub type TeaResult<T> = Result<T, TeaError>;
