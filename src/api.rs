//! Free functions with the default [`Config`](crate::Config).
//!
//! Each one is shorthand for the method of the same name on
//! [`SpectralAnalyzer::new()`].

use nalgebra::DVector;

use crate::analysis::Fingerprint;
use crate::analyzer::SpectralAnalyzer;
use crate::decomposition::Decomposition;
use crate::error::Result;
use crate::operator::TransitionOperator;
use crate::types::{Complex64, Norm};

/// See [`SpectralAnalyzer::rdl_decomposition`].
pub fn rdl_decomposition<T>(t: &T, k: Option<usize>, norm: Norm) -> Result<Decomposition>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().rdl_decomposition(t, k, norm)
}

/// See [`SpectralAnalyzer::timescales`].
pub fn timescales<T>(t: &T, tau: f64, k: Option<usize>) -> Result<Vec<f64>>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().timescales(t, tau, k)
}

/// See [`SpectralAnalyzer::eigenvalues`].
pub fn eigenvalues<T>(t: &T, k: Option<usize>) -> Result<Vec<Complex64>>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().eigenvalues(t, k)
}

/// See [`SpectralAnalyzer::stationary_distribution`].
pub fn stationary_distribution<T>(t: &T) -> Result<DVector<f64>>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().stationary_distribution(t)
}

/// See [`SpectralAnalyzer::is_reversible`].
pub fn is_reversible<T>(t: &T) -> Result<bool>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().is_reversible(t)
}

/// See [`SpectralAnalyzer::expectation`].
pub fn expectation<T>(t: &T, obs: &[f64]) -> Result<f64>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().expectation(t, obs)
}

/// See [`SpectralAnalyzer::correlation`].
pub fn correlation<T>(
    t: &T,
    obs1: &[f64],
    obs2: Option<&[f64]>,
    times: &[f64],
    k: Option<usize>,
) -> Result<Vec<f64>>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().correlation(t, obs1, obs2, times, k)
}

/// See [`SpectralAnalyzer::relaxation`].
pub fn relaxation<T>(
    t: &T,
    p0: &[f64],
    obs: &[f64],
    times: &[f64],
    k: Option<usize>,
) -> Result<Vec<f64>>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().relaxation(t, p0, obs, times, k)
}

/// See [`SpectralAnalyzer::fingerprint_correlation`].
pub fn fingerprint_correlation<T>(
    t: &T,
    obs1: &[f64],
    obs2: Option<&[f64]>,
    k: Option<usize>,
    tau: f64,
) -> Result<Fingerprint>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().fingerprint_correlation(t, obs1, obs2, k, tau)
}

/// See [`SpectralAnalyzer::fingerprint_relaxation`].
pub fn fingerprint_relaxation<T>(
    t: &T,
    p0: &[f64],
    obs: &[f64],
    k: Option<usize>,
    tau: f64,
) -> Result<Fingerprint>
where
    T: TransitionOperator + ?Sized,
{
    SpectralAnalyzer::new().fingerprint_relaxation(t, p0, obs, k, tau)
}
