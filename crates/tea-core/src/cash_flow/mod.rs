//! Year-by-year cash-flow projection of a process facility and the NPV,
//! IRR and minimum-selling-price solves built on it.

pub mod analysis;
pub mod composition;
pub mod flows;
pub mod model;
pub mod params;

pub use analysis::{run_tea, TeaInput, TeaOutput, TeaSolve};
pub use composition::{
    AnnualFlows, CashFlowComposition, ConventionalComposition, HourlyVariableCost,
    VariableCostModel,
};
pub use model::{
    CashFlowRow, CashFlowTable, TeaModel, DEFAULT_IRR_BOUNDS, DEFAULT_PRICE_BOUNDS,
};
pub use params::{DepreciationSchedule, OtherCostTreatment, TeaDefaults, TeaParams};
