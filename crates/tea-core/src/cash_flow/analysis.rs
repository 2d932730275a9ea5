use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::model::{CashFlowRow, TeaModel, DEFAULT_IRR_BOUNDS, DEFAULT_PRICE_BOUNDS};
use super::params::{DepreciationSchedule, TeaParams};
use crate::error::TeaError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::TeaResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

fn irr_lower() -> Rate {
    DEFAULT_IRR_BOUNDS.0
}

fn irr_upper() -> Rate {
    DEFAULT_IRR_BOUNDS.1
}

fn price_lower() -> Money {
    DEFAULT_PRICE_BOUNDS.0
}

fn price_upper() -> Money {
    DEFAULT_PRICE_BOUNDS.1
}

/// Which quantity to compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TeaSolve {
    /// NPV at `irr` (the parameter set's IRR when absent)
    Npv {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        irr: Option<Rate>,
    },
    /// IRR at which NPV equals `target_npv`
    Irr {
        #[serde(default)]
        target_npv: Money,
        #[serde(default = "irr_lower")]
        lower_bound: Rate,
        #[serde(default = "irr_upper")]
        upper_bound: Rate,
    },
    /// Minimum product selling price at which NPV equals `target_npv`
    Mpsp {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        irr: Option<Rate>,
        #[serde(default)]
        product_index: usize,
        #[serde(default)]
        target_npv: Money,
        #[serde(default = "price_lower")]
        lower_bound: Money,
        #[serde(default = "price_upper")]
        upper_bound: Money,
    },
}

impl Default for TeaSolve {
    fn default() -> Self {
        TeaSolve::Npv { irr: None }
    }
}

/// Parameter set plus the requested solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeaInput {
    pub parameters: TeaParams,
    #[serde(default)]
    pub solve: TeaSolve,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeaOutput {
    /// "npv", "irr" or "mpsp"
    pub solved_for: String,
    /// The headline answer of the solve
    pub solved_value: Decimal,
    pub npv: Money,
    pub irr: Rate,
    /// Solved selling price, only for MPSP solves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpsp: Option<Money>,
    pub product_prices: Vec<Money>,
    pub discount_rate: Rate,
    pub fixed_capital_investment: Money,
    pub annual_fixed_operating_cost: Money,
    pub annual_variable_operating_cost: Money,
    pub annual_sales: Money,
    pub loan_payment_start_year: usize,
    /// First year in which cumulative present value is non-negative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_payback_year: Option<u32>,
    pub cash_flows: Vec<CashFlowRow>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Validate the parameters, run the requested solve and report every
/// annual series of the final evaluation.
pub fn run_tea(input: &TeaInput) -> TeaResult<ComputationOutput<TeaOutput>> {
    let start = Instant::now();

    let mut model = TeaModel::new(input.parameters.clone())?;
    let mut warnings = model.warnings().to_vec();

    let (solved_for, methodology, solved_value, mpsp) = match &input.solve {
        TeaSolve::Npv { irr } => {
            let irr = irr.unwrap_or(input.parameters.irr);
            let npv = model.npv_given_irr(irr)?;
            ("npv", "Discounted Cash Flow NPV at Fixed IRR", npv, None)
        }
        TeaSolve::Irr {
            target_npv,
            lower_bound,
            upper_bound,
        } => {
            let irr = model.irr_given_npv(*target_npv, *lower_bound, *upper_bound)?;
            ("irr", "IRR at Target NPV (Bracketed Bisection)", irr, None)
        }
        TeaSolve::Mpsp {
            irr,
            product_index,
            target_npv,
            lower_bound,
            upper_bound,
        } => {
            let irr = irr.unwrap_or(input.parameters.irr);
            let price =
                model.mpsp_given_irr(irr, *product_index, *target_npv, *lower_bound, *upper_bound)?;
            (
                "mpsp",
                "Minimum Product Selling Price at Fixed IRR (Bracketed Bisection)",
                price,
                Some(price),
            )
        }
    };

    let table = model
        .cash_flow_table()
        .ok_or_else(|| TeaError::invalid("solve", "No cash-flow table was computed"))?;

    let discounted_payback_year = table
        .cumulative_present_value
        .iter()
        .position(|v| *v >= Decimal::ZERO)
        .map(|y| y as u32);
    if discounted_payback_year.is_none() {
        warnings.push("Cumulative present value never turns non-negative within the project".into());
    }

    let output = TeaOutput {
        solved_for: solved_for.to_string(),
        solved_value,
        npv: table.npv,
        irr: table.irr,
        mpsp,
        product_prices: model.params().product_prices.clone(),
        discount_rate: table.discount_rate,
        fixed_capital_investment: model.fci(),
        annual_fixed_operating_cost: model.foc(),
        annual_variable_operating_cost: model.voc(),
        annual_sales: model.annual_sales(),
        loan_payment_start_year: table.loan_payment_start_year,
        discounted_payback_year,
        cash_flows: table.rows(),
    };

    let p = &input.parameters;
    let assumptions = serde_json::json!({
        "project_duration": p.project_duration,
        "construction_years": p.construction_schedule.len(),
        "income_tax": p.income_tax.to_string(),
        "inflation_rate": p.inflation_rate.to_string(),
        "depreciation": match &p.depreciation_schedule {
            DepreciationSchedule::Linear => "linear",
            DepreciationSchedule::Explicit(_) => "explicit",
        },
        "other_costs_treatment": p.other_costs_treatment,
        "solve": input.solve,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, &assumptions, warnings, elapsed, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(solve: TeaSolve) -> TeaInput {
        let mut parameters = TeaParams::new(
            dec!(0.10),
            20,
            dec!(2_000_000),
            dec!(40),
            vec![dec!(100)],
            vec![dec!(1.5)],
        );
        parameters.construction_schedule = vec![dec!(0.6), dec!(0.4)];
        parameters.labor_cost = dec!(200_000);
        TeaInput { parameters, solve }
    }

    #[test]
    fn test_npv_solve_reports_every_year() {
        let result = run_tea(&input(TeaSolve::default())).unwrap();
        let out = &result.result;
        assert_eq!(out.solved_for, "npv");
        assert_eq!(out.solved_value, out.npv);
        assert_eq!(out.irr, dec!(0.10));
        assert_eq!(out.cash_flows.len(), 20);
        assert_eq!(out.cash_flows.last().unwrap().cumulative_present_value, out.npv);
        assert!(out.mpsp.is_none());
    }

    #[test]
    fn test_mpsp_solve_sets_price() {
        let solve = TeaSolve::Mpsp {
            irr: Some(dec!(0.12)),
            product_index: 0,
            target_npv: Decimal::ZERO,
            lower_bound: dec!(0),
            upper_bound: dec!(100),
        };
        let result = run_tea(&input(solve)).unwrap();
        let out = &result.result;
        assert_eq!(out.solved_for, "mpsp");
        assert_eq!(out.mpsp, Some(out.product_prices[0]));
        assert_eq!(out.irr, dec!(0.12));
        assert!(out.npv.abs() < dec!(0.00001));
    }

    #[test]
    fn test_irr_solve_brackets_failure_surfaces() {
        let solve = TeaSolve::Irr {
            target_npv: dec!(1_000_000_000_000),
            lower_bound: dec!(0),
            upper_bound: dec!(10),
        };
        assert!(matches!(
            run_tea(&input(solve)),
            Err(TeaError::BracketFailure { .. })
        ));
    }

    #[test]
    fn test_solve_defaults_from_json() {
        let solve: TeaSolve = serde_json::from_str(r#"{"type": "mpsp"}"#).unwrap();
        assert_eq!(
            solve,
            TeaSolve::Mpsp {
                irr: None,
                product_index: 0,
                target_npv: Decimal::ZERO,
                lower_bound: Decimal::ZERO,
                upper_bound: dec!(100),
            }
        );
        let solve: TeaSolve = serde_json::from_str(r#"{"type": "irr"}"#).unwrap();
        assert_eq!(
            solve,
            TeaSolve::Irr {
                target_npv: Decimal::ZERO,
                lower_bound: Decimal::ZERO,
                upper_bound: dec!(10),
            }
        );
    }
}
