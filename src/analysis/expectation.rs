//! Stationary expectation values.

use nalgebra::DVector;

use crate::error::Result;
use crate::operator::check_length;

/// `⟨obs⟩_μ = Σ_i μ_i obs_i`.
pub fn stationary_expectation(stationary: &DVector<f64>, obs: &[f64]) -> Result<f64> {
    check_length("obs", obs.len(), stationary.len())?;
    Ok(stationary.iter().zip(obs).map(|(m, o)| m * o).sum())
}
