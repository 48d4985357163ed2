//! Implied relaxation timescales.

use crate::constants::{IMAGINARY_TOLERANCE, UNIT_MODULUS_TOLERANCE};
use crate::error::{FingerprintError, Result};
use crate::types::Complex64;

/// Implied timescale `-τ / ln|λ|` of a single eigenvalue.
///
/// Unit-modulus eigenvalues never decay (`+∞`), and neither does a modulus
/// that rounding pushed above one; `λ = 0` decays instantly (`0`). The phase
/// of a complex eigenvalue is ignored.
pub fn implied_timescale(lambda: Complex64, tau: f64) -> f64 {
    let modulus = lambda.norm();
    if modulus >= 1.0 - UNIT_MODULUS_TOLERANCE {
        f64::INFINITY
    } else if modulus == 0.0 {
        0.0
    } else {
        -tau / modulus.ln()
    }
}

/// Timescales of a sequence of eigenvalues, order preserved.
///
/// Warns once if the spectrum has non-real eigenvalues (their oscillation
/// is lost) or more than one unit-modulus eigenvalue (periodic or
/// disconnected chain).
pub fn timescales_from_eigenvalues(eigenvalues: &[Complex64], tau: f64) -> Result<Vec<f64>> {
    check_lag(tau)?;

    let non_real = eigenvalues
        .iter()
        .filter(|z| z.im.abs() > IMAGINARY_TOLERANCE)
        .count();
    if non_real > 0 {
        tracing::warn!(
            count = non_real,
            "complex eigenvalues: timescales use the modulus, oscillations are dropped"
        );
    }

    let unit = eigenvalues
        .iter()
        .filter(|z| (z.norm() - 1.0).abs() <= UNIT_MODULUS_TOLERANCE)
        .count();
    if unit > 1 {
        tracing::warn!(count = unit, "multiple eigenvalues of modulus one");
    }

    Ok(eigenvalues
        .iter()
        .map(|&lambda| implied_timescale(lambda, tau))
        .collect())
}

/// Lag time must be finite and positive.
pub(crate) fn check_lag(tau: f64) -> Result<()> {
    if !(tau.is_finite() && tau > 0.0) {
        return Err(FingerprintError::NumericDomain {
            argument: "tau",
            value: tau,
            requirement: "finite and > 0",
        });
    }
    Ok(())
}
