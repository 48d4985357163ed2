//! Spectral sums at explicit observation times.

use crate::error::{FingerprintError, Result};
use crate::math::{decay, pow_steps};
use crate::types::Complex64;

/// Observation times must be finite and non-negative.
pub fn check_times(times: &[f64]) -> Result<()> {
    if let Some(&t) = times.iter().find(|t| !(t.is_finite() && **t >= 0.0)) {
        return Err(FingerprintError::NumericDomain {
            argument: "times",
            value: t,
            requirement: "finite and >= 0",
        });
    }
    Ok(())
}

/// `f(t) = Re Σ_i a_i λ_i^(t/τ)` for each time.
pub fn spectral_sum(
    eigenvalues: &[Complex64],
    amplitudes: &[Complex64],
    times: &[f64],
    tau: f64,
) -> Vec<f64> {
    times
        .iter()
        .map(|&t| {
            let steps = t / tau;
            eigenvalues
                .iter()
                .zip(amplitudes)
                .map(|(&lambda, &a)| a * pow_steps(lambda, steps))
                .sum::<Complex64>()
                .re
        })
        .collect()
}

/// `f(t) = Σ_i a_i exp(-t / t_i)`: the real decay envelope, ignoring phases.
pub fn envelope_sum(timescales: &[f64], amplitudes: &[f64], times: &[f64]) -> Vec<f64> {
    times
        .iter()
        .map(|&t| {
            timescales
                .iter()
                .zip(amplitudes)
                .map(|(&ts, &a)| a * decay(t, ts))
                .sum()
        })
        .collect()
}
