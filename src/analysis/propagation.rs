//! Correlation and relaxation functions by repeated matrix-vector products.
//!
//! Exact for any chain (no decomposition involved), and cheaper than a full
//! eigendecomposition as long as the largest time is small. The cost is one
//! product per step up to the largest time, so times beyond
//! [`MAX_PROPAGATION_STEPS`] are refused.

use nalgebra::DVector;

use crate::constants::MAX_PROPAGATION_STEPS;
use crate::error::{DecompositionError, FingerprintError, Result};
use crate::math::is_integer;
use crate::operator::TransitionOperator;

/// `weights · Tᵗ · observable` for each (integer) time `t`.
///
/// Times may come in any order; each power of T is formed once. Fails with
/// [`DecompositionError::TruncationRequired`] if the largest time exceeds
/// [`MAX_PROPAGATION_STEPS`]: such horizons need the spectral route.
pub fn propagate<T>(
    operator: &T,
    weights: &DVector<f64>,
    observable: &DVector<f64>,
    times: &[f64],
) -> Result<Vec<f64>>
where
    T: TransitionOperator + ?Sized,
{
    if let Some(&t) = times.iter().find(|&&t| !(is_integer(t) && t >= 0.0)) {
        return Err(FingerprintError::NumericDomain {
            argument: "times",
            value: t,
            requirement: "whole number of steps for direct propagation",
        });
    }
    let horizon = times.iter().copied().fold(0.0_f64, f64::max);
    if horizon > MAX_PROPAGATION_STEPS as f64 {
        tracing::warn!(horizon, budget = MAX_PROPAGATION_STEPS, "propagation horizon too long");
        return Err(DecompositionError::TruncationRequired.into());
    }

    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&a, &b| times[a].total_cmp(&times[b]));

    let mut result = vec![0.0; times.len()];
    let mut current = observable.clone();
    let mut step = 0.0;
    for idx in order {
        while step < times[idx] {
            current = operator.matvec(&current);
            step += 1.0;
        }
        result[idx] = weights.dot(&current);
    }

    tracing::debug!(steps = step, times = times.len(), "direct propagation");
    Ok(result)
}
