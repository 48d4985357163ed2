//! Scalar helpers for spectral sums.

use crate::types::Complex64;

/// Raise an eigenvalue to a (possibly fractional) number of steps.
///
/// Integer exponents use repeated squaring, so a real eigenvalue stays exactly
/// real and negative eigenvalues keep their sign. Fractional exponents go
/// through the principal branch of the complex logarithm.
#[inline]
pub fn pow_steps(lambda: Complex64, steps: f64) -> Complex64 {
    if steps == 0.0 {
        return Complex64::new(1.0, 0.0);
    }
    if is_integer(steps) && steps <= i32::MAX as f64 {
        lambda.powi(steps as i32)
    } else if lambda.norm() == 0.0 {
        Complex64::new(0.0, 0.0)
    } else {
        lambda.powf(steps)
    }
}

/// Decay factor `exp(-t / t_i)` of a mode with implied timescale `t_i`.
///
/// An infinite timescale never decays; a zero timescale is gone after any
/// positive time.
#[inline]
pub fn decay(time: f64, timescale: f64) -> f64 {
    if timescale.is_infinite() || time == 0.0 {
        1.0
    } else if timescale == 0.0 {
        0.0
    } else {
        (-time / timescale).exp()
    }
}

/// True if `x` is a finite whole number.
#[inline]
pub fn is_integer(x: f64) -> bool {
    x.is_finite() && x.fract() == 0.0
}
