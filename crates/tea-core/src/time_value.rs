use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::TeaError;
use crate::types::{Money, Rate};
use crate::TeaResult;

fn growth_factor(rate: Rate, years: u32, context: &str) -> TeaResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(TeaError::invalid(
            "rate",
            "Interest rate must be greater than -100%",
        ));
    }
    (Decimal::ONE + rate)
        .checked_powu(u64::from(years))
        .ok_or_else(|| TeaError::invalid(context, "Compounding factor overflows decimal range"))
}

/// Present value of a single future amount: F / (1 + r)^n
pub fn present_value(future_value: Money, years: u32, rate: Rate) -> TeaResult<Money> {
    let factor = growth_factor(rate, years, "present_value")?;
    if factor.is_zero() {
        return Err(TeaError::DivisionByZero {
            context: "present value factor".into(),
        });
    }
    Ok(future_value / factor)
}

/// Future value of a single present amount: P * (1 + r)^n
pub fn future_value(present_value: Money, years: u32, rate: Rate) -> TeaResult<Money> {
    Ok(present_value * growth_factor(rate, years, "future_value")?)
}

/// Level annual amount over `years` periods equivalent to `present_value`
/// (capital recovery factor times principal).
pub fn annualized_value(present_value: Money, years: u32, rate: Rate) -> TeaResult<Money> {
    if years == 0 {
        return Err(TeaError::invalid(
            "years",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(present_value / Decimal::from(years));
    }

    let factor = growth_factor(rate, years, "annualized_value")?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(TeaError::DivisionByZero {
            context: "capital recovery factor".into(),
        });
    }

    Ok(present_value * rate * factor / denominator)
}

/// P/F factors `1 / (1 + r)^i` for `i = 0..periods`.
///
/// Built by repeated multiplication with `1 / (1 + r)`, so very large rates
/// underflow towards zero. Rates close to -100% grow the factors instead;
/// leaving the decimal range is an input error.
pub fn discount_factors(rate: Rate, periods: usize) -> TeaResult<Vec<Decimal>> {
    if rate <= dec!(-1) {
        return Err(TeaError::invalid(
            "discount_rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let step = Decimal::ONE
        .checked_div(Decimal::ONE + rate)
        .ok_or_else(|| TeaError::DivisionByZero {
            context: "discount factor".into(),
        })?;
    let mut factors = Vec::with_capacity(periods);
    let mut factor = Decimal::ONE;
    for year in 0..periods {
        factors.push(factor);
        if year + 1 < periods {
            factor = factor
                .checked_mul(step)
                .ok_or_else(|| factor_overflow(rate, year + 1))?;
        }
    }
    Ok(factors)
}

fn factor_overflow(rate: Rate, year: usize) -> TeaError {
    TeaError::invalid(
        "discount_rate",
        format!("Discount factor at rate {rate} overflows decimal range in year {year}"),
    )
}

/// Present values `flow[i] * factor[i]`, with overflow reported as an error.
pub fn discounted(flows: &[Money], factors: &[Decimal]) -> TeaResult<Vec<Money>> {
    flows
        .iter()
        .zip(factors.iter())
        .enumerate()
        .map(|(year, (cf, f))| {
            cf.checked_mul(*f).ok_or_else(|| {
                TeaError::invalid(
                    "discount_rate",
                    format!("Present value in year {year} overflows decimal range"),
                )
            })
        })
        .collect()
}

/// Sum of present values, with overflow reported as an error.
pub fn checked_total(values: &[Money]) -> TeaResult<Money> {
    values.iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v)
            .ok_or_else(|| TeaError::invalid("discount_rate", "Net present value overflows decimal range"))
    })
}

/// Net Present Value of a series of annual cash flows, first flow undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> TeaResult<Money> {
    let factors = discount_factors(rate, cash_flows.len())?;
    checked_total(&discounted(cash_flows, &factors)?)
}
