//! Bracketing root finder shared by the IRR and selling-price solves.
//!
//! Bisection narrows the bracket until its width is below `xtol`; a single
//! false-position step inside the final bracket then places the answer on
//! the secant, which is exact whenever the objective is linear there.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::TeaError;
use crate::TeaResult;

/// Default absolute tolerance on the solved variable.
pub const DEFAULT_XTOL: Decimal = dec!(0.00001);

/// Maximum bisection iterations.
const BISECTION_MAX_ITER: u32 = 200;

/// Find `x` in `[lower_bound, upper_bound]` with `f(x) == target`.
///
/// `quantity` names the solved variable in error messages. The objective
/// `f(x) - target` must change sign across the bracket, otherwise
/// [`TeaError::BracketFailure`] reports both bounds and both evaluations.
pub fn solve_bracketed<F>(
    quantity: &str,
    target: Decimal,
    lower_bound: Decimal,
    upper_bound: Decimal,
    xtol: Decimal,
    mut f: F,
) -> TeaResult<Decimal>
where
    F: FnMut(Decimal) -> TeaResult<Decimal>,
{
    if lower_bound >= upper_bound {
        return Err(TeaError::invalid(
            "lower_bound",
            format!("Lower bound {lower_bound} must be below upper bound {upper_bound}"),
        ));
    }
    if xtol <= Decimal::ZERO {
        return Err(TeaError::invalid("xtol", "Tolerance must be positive"));
    }

    let mut lo = lower_bound;
    let mut hi = upper_bound;
    let mut objective = |x: Decimal| -> TeaResult<Decimal> {
        f(x)?.checked_sub(target).ok_or_else(|| {
            TeaError::invalid(
                "target",
                format!("{quantity} objective at {x} overflows decimal range"),
            )
        })
    };

    let mut f_lo = objective(lo)?;
    let mut f_hi = objective(hi)?;

    if f_lo.is_zero() {
        return Ok(lo);
    }
    if f_hi.is_zero() {
        return Ok(hi);
    }
    if f_lo.is_sign_negative() == f_hi.is_sign_negative() {
        return Err(TeaError::BracketFailure {
            quantity: quantity.to_string(),
            target,
            lower_bound,
            upper_bound,
            objective_at_lower: f_lo,
            objective_at_upper: f_hi,
        });
    }

    for _ in 0..BISECTION_MAX_ITER {
        if hi - lo < xtol {
            // False-position step; f_lo and f_hi have opposite signs.
            let x = false_position(lo, hi, f_lo, f_hi).unwrap_or((lo + hi) / dec!(2));
            return Ok(x.max(lo).min(hi));
        }

        let mid = (lo + hi) / dec!(2);
        let f_mid = objective(mid)?;
        if f_mid.is_zero() {
            return Ok(mid);
        }

        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
            f_hi = f_mid;
        }
    }

    Err(TeaError::ConvergenceFailure {
        function: format!("{quantity} bisection"),
        iterations: BISECTION_MAX_ITER,
        last_delta: hi - lo,
    })
}

fn false_position(lo: Decimal, hi: Decimal, f_lo: Decimal, f_hi: Decimal) -> Option<Decimal> {
    let slope_den = f_hi.checked_sub(f_lo)?;
    let step = f_lo.checked_mul(hi - lo)?.checked_div(slope_den)?;
    lo.checked_sub(step)
}
