use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use std::str::FromStr;

use tea_core::cash_flow::{
    self, TeaDefaults, TeaInput, TeaParams, TeaSolve, DEFAULT_IRR_BOUNDS, DEFAULT_PRICE_BOUNDS,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_decimal(field: &str, value: &str) -> NapiResult<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| to_napi_error(format!("Invalid {field} '{value}': {e}")))
}

fn parse_optional(field: &str, value: Option<String>) -> NapiResult<Option<Decimal>> {
    value.map(|v| parse_decimal(field, &v)).transpose()
}

fn solve(params_json: &str, solve: TeaSolve) -> NapiResult<String> {
    let parameters: TeaParams = serde_json::from_str(params_json).map_err(to_napi_error)?;
    let output = cash_flow::run_tea(&TeaInput { parameters, solve }).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Cash-flow analysis
// ---------------------------------------------------------------------------

/// Full `{ "parameters": ..., "solve": ... }` request.
#[napi]
pub fn run_tea(input_json: String) -> NapiResult<String> {
    let input: TeaInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cash_flow::run_tea(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn npv_given_irr(params_json: String, irr: Option<String>) -> NapiResult<String> {
    let irr = parse_optional("irr", irr)?;
    solve(&params_json, TeaSolve::Npv { irr })
}

#[napi]
pub fn irr_given_npv(
    params_json: String,
    target_npv: Option<String>,
    lower_bound: Option<String>,
    upper_bound: Option<String>,
) -> NapiResult<String> {
    let request = TeaSolve::Irr {
        target_npv: parse_optional("target_npv", target_npv)?.unwrap_or(Decimal::ZERO),
        lower_bound: parse_optional("lower_bound", lower_bound)?.unwrap_or(DEFAULT_IRR_BOUNDS.0),
        upper_bound: parse_optional("upper_bound", upper_bound)?.unwrap_or(DEFAULT_IRR_BOUNDS.1),
    };
    solve(&params_json, request)
}

#[napi]
pub fn mpsp_given_irr(
    params_json: String,
    irr: Option<String>,
    product_index: Option<u32>,
    target_npv: Option<String>,
    lower_bound: Option<String>,
    upper_bound: Option<String>,
) -> NapiResult<String> {
    let request = TeaSolve::Mpsp {
        irr: parse_optional("irr", irr)?,
        product_index: product_index.unwrap_or(0) as usize,
        target_npv: parse_optional("target_npv", target_npv)?.unwrap_or(Decimal::ZERO),
        lower_bound: parse_optional("lower_bound", lower_bound)?.unwrap_or(DEFAULT_PRICE_BOUNDS.0),
        upper_bound: parse_optional("upper_bound", upper_bound)?.unwrap_or(DEFAULT_PRICE_BOUNDS.1),
    };
    solve(&params_json, request)
}

/// Default value of every optional parameter.
#[napi]
pub fn default_parameters() -> NapiResult<String> {
    serde_json::to_string(&TeaDefaults::default()).map_err(to_napi_error)
}
