//! Per-category annual flows. Each function returns one value per project
//! year; costs are positive amounts, the composition step applies signs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::params::{DepreciationSchedule, TeaParams};
use crate::error::TeaError;
use crate::time_value::annualized_value;
use crate::types::{AnnualFlow, Money, Rate};
use crate::TeaResult;

// ---------------------------------------------------------------------------
// Derived scalars
// ---------------------------------------------------------------------------

/// Fixed capital investment.
pub fn fci(params: &TeaParams) -> Money {
    params.purchase_cost * params.lang_factor
}

/// Annual fixed operating cost.
pub fn foc(params: &TeaParams) -> Money {
    match params.hourly_fixed_operating_cost {
        Some(hourly) if !hourly.is_zero() => hourly * params.annual_operating_hours,
        _ => {
            fci(params)
                * (params.property_tax
                    + params.property_insurance
                    + params.maintenance
                    + params.administration)
                + params.labor_cost * (Decimal::ONE + params.fringe_benefits + params.supplies)
        }
    }
}

/// Annual sales revenue across all products.
pub fn annual_sales(params: &TeaParams) -> Money {
    params
        .product_prices
        .iter()
        .zip(params.hourly_product_flows.iter())
        .map(|(price, flow)| price * flow)
        .sum::<Decimal>()
        * params.annual_operating_hours
}

pub fn loan_principal(params: &TeaParams) -> Money {
    params.finance_fraction * fci(params)
}

/// Real discount rate: (1 + irr) / (1 + inflation) - 1.
pub fn discount_rate(irr: Rate, inflation_rate: Rate) -> TeaResult<Rate> {
    let denominator = Decimal::ONE + inflation_rate;
    if denominator.is_zero() {
        return Err(TeaError::DivisionByZero {
            context: "inflation-adjusted discount rate".into(),
        });
    }
    Ok((Decimal::ONE + irr) / denominator - Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Capital
// ---------------------------------------------------------------------------

/// `amount` spread over the construction years, zero afterwards.
fn construction_spread(params: &TeaParams, amount: Money) -> AnnualFlow {
    let mut flow = vec![Decimal::ZERO; params.duration()];
    for (slot, fraction) in flow.iter_mut().zip(params.construction_schedule.iter()) {
        *slot = amount * fraction;
    }
    flow
}

pub fn fci_flow(params: &TeaParams) -> AnnualFlow {
    construction_spread(params, fci(params))
}

pub fn depreciation_flow(params: &TeaParams) -> TeaResult<AnnualFlow> {
    let n = params.duration();
    let capital = fci(params);
    match &params.depreciation_schedule {
        DepreciationSchedule::Linear => {
            // Last year absorbs the rounding remainder so the flow sums to FCI.
            let annual = capital / Decimal::from(n as u64);
            let mut flow = vec![annual; n];
            if let Some(last) = flow.last_mut() {
                *last = capital - annual * Decimal::from(n as u64 - 1);
            }
            Ok(flow)
        }
        DepreciationSchedule::Explicit(fractions) => {
            if fractions.len() != n {
                return Err(TeaError::invalid(
                    "depreciation_schedule",
                    format!("Expected {n} entries, got {}", fractions.len()),
                ));
            }
            Ok(fractions.iter().map(|f| f * capital).collect())
        }
    }
}

pub fn working_capital_flow(params: &TeaParams) -> AnnualFlow {
    let mut flow = vec![Decimal::ZERO; params.duration()];
    if let Some(first) = flow.first_mut() {
        *first = params.wc_over_fci * fci(params);
    }
    flow
}

// ---------------------------------------------------------------------------
// Operating flows with startup ramp-up
// ---------------------------------------------------------------------------

/// Blend of the startup fraction over `startup_months` and full output for
/// the rest of the first operating year.
pub fn startup_factor(startup_months: Decimal, startup_frac: Rate) -> Decimal {
    let portion = startup_months / dec!(12);
    portion * startup_frac + (Decimal::ONE - portion)
}

/// Zero through the last construction year, ramped in the first operating
/// year, `annual` afterwards.
pub fn apply_startup_ramp(
    params: &TeaParams,
    annual: Money,
    startup_frac: Rate,
) -> TeaResult<AnnualFlow> {
    let n = params.duration();
    let first_operating_year = params.startup_year() + 1;
    if first_operating_year >= n {
        return Err(TeaError::invalid(
            "construction_schedule",
            format!("First operating year {first_operating_year} is outside a {n}-year project"),
        ));
    }

    let mut flow = vec![annual; n];
    for slot in flow.iter_mut().take(first_operating_year) {
        *slot = Decimal::ZERO;
    }
    flow[first_operating_year] = startup_factor(params.startup_months, startup_frac) * annual;
    Ok(flow)
}

pub fn foc_flow(params: &TeaParams) -> TeaResult<AnnualFlow> {
    apply_startup_ramp(params, foc(params), params.startup_foc_frac)
}

/// VOC flow for an annual VOC supplied by the variable-cost hook.
pub fn voc_flow(params: &TeaParams, annual_voc: Money) -> TeaResult<AnnualFlow> {
    apply_startup_ramp(params, annual_voc, params.startup_voc_frac)
}

pub fn sales_flow(params: &TeaParams) -> TeaResult<AnnualFlow> {
    apply_startup_ramp(params, annual_sales(params), params.startup_sales_frac)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

/// Interest-only loan charges and the year level payments begin.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanInterestSchedule {
    pub flow: AnnualFlow,
    pub loan_payment_start_year: usize,
}

pub fn loan_principal_flow(params: &TeaParams) -> AnnualFlow {
    construction_spread(params, loan_principal(params))
}

/// Interest on the principal disbursed so far, charged each year until
/// construction ends or the loan term runs out.
pub fn loan_interest_only_payments_flow(params: &TeaParams) -> LoanInterestSchedule {
    let start = params.loan_payment_start_year();
    let principal = loan_principal_flow(params);
    let mut flow = vec![Decimal::ZERO; params.duration()];
    let mut disbursed = Decimal::ZERO;
    for y in 0..start.min(flow.len()) {
        disbursed += principal[y];
        flow[y] = params.finance_interest * disbursed;
    }
    LoanInterestSchedule {
        flow,
        loan_payment_start_year: start,
    }
}

/// Level annuity payments on the financed share of FCI over
/// `[loan_payment_start_year, finance_years)`.
pub fn loan_payments_flow(
    params: &TeaParams,
    loan_payment_start_year: usize,
) -> TeaResult<AnnualFlow> {
    let n = params.duration();
    let mut flow = vec![Decimal::ZERO; n];
    let amount = loan_principal(params);
    if amount.is_zero() {
        return Ok(flow);
    }

    let end = params.finance_years as usize;
    if end <= loan_payment_start_year || end > n {
        return Err(TeaError::invalid(
            "finance_years",
            format!(
                "Repayment window [{loan_payment_start_year}, {end}) does not fit a {n}-year project"
            ),
        ));
    }

    let periods = (end - loan_payment_start_year) as u32;
    let payment = annualized_value(amount, periods, params.finance_interest)?;
    for slot in flow.iter_mut().take(end).skip(loan_payment_start_year) {
        *slot = payment;
    }
    Ok(flow)
}

/// Interest share of each level payment: `finance_interest` on the balance
/// still outstanding. The rest of the payment retires principal.
pub fn loan_payment_interest_flow(
    params: &TeaParams,
    loan_payment_start_year: usize,
    loan_payments: &[Money],
) -> AnnualFlow {
    let n = params.duration();
    let mut flow = vec![Decimal::ZERO; n];
    let mut balance = loan_principal(params);
    for y in loan_payment_start_year..n.min(loan_payments.len()) {
        if loan_payments[y].is_zero() || balance <= Decimal::ZERO {
            continue;
        }
        let interest = params.finance_interest * balance;
        flow[y] = interest;
        balance -= loan_payments[y] - interest;
    }
    flow
}

// ---------------------------------------------------------------------------
// Other
// ---------------------------------------------------------------------------

pub fn incentives_flow(params: &TeaParams) -> AnnualFlow {
    vec![params.incentives; params.duration()]
}

pub fn other_costs_flow(params: &TeaParams) -> AnnualFlow {
    params
        .other_costs_across_project_duration
        .clone()
        .unwrap_or_else(|| vec![Decimal::ZERO; params.duration()])
}
