//! Spectral fingerprints of correlation and relaxation functions.
//!
//! A fingerprint is the list of (timescale, amplitude) pairs whose sum of
//! exponentials reproduces the function:
//!
//! ```text
//! correlation:  a_i = (μ ⊙ obs1 · r_i) (l_i · obs2)
//! relaxation:   a_i = (p0 · r_i) (l_i · obs)
//! f(t) = Σ_i a_i λ_i^(t/τ)
//! ```
//!
//! Amplitudes are invariant to the per-mode scaling freedom of the
//! eigenvector bases, so every normalization yields the same fingerprint.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use super::evaluate::{check_times, envelope_sum, spectral_sum};
use super::timescales::{check_lag, timescales_from_eigenvalues};
use crate::constants::IMAGINARY_TOLERANCE;
use crate::decomposition::Decomposition;
use crate::error::Result;
use crate::operator::check_length;
use crate::types::{to_complex, Complex64};

/// Timescales and amplitudes of a correlation or relaxation function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Implied timescales `-τ / ln|λ_i|`, in the same unit as τ (already
    /// multiplied by the lag; with τ = 1 they count steps of T).
    pub timescales: Vec<f64>,

    /// Real parts of the amplitudes, index-aligned with `timescales`.
    pub amplitudes: Vec<f64>,

    /// Eigenvalues the timescales were derived from.
    pub eigenvalues: Vec<Complex64>,

    /// Full complex amplitudes.
    ///
    /// Only differ from `amplitudes` for non-reversible chains with complex
    /// eigenvalues, where conjugate pairs carry conjugate amplitudes.
    pub spectral_amplitudes: Vec<Complex64>,

    /// Lag time τ of one step of the transition matrix.
    pub tau: f64,
}

impl Fingerprint {
    pub(crate) fn from_spectrum(
        eigenvalues: Vec<Complex64>,
        spectral_amplitudes: Vec<Complex64>,
        tau: f64,
    ) -> Result<Self> {
        let timescales = timescales_from_eigenvalues(&eigenvalues, tau)?;
        let amplitudes = spectral_amplitudes.iter().map(|a| a.re).collect();
        Ok(Self {
            timescales,
            amplitudes,
            eigenvalues,
            spectral_amplitudes,
            tau,
        })
    }

    /// Number of modes.
    pub fn len(&self) -> usize {
        self.timescales.len()
    }

    /// True if there are no modes.
    pub fn is_empty(&self) -> bool {
        self.timescales.is_empty()
    }

    /// True if some eigenvalue has a non-negligible imaginary part.
    ///
    /// Such functions oscillate; [`evaluate_from_timescales`](Self::evaluate_from_timescales)
    /// then only gives the decay envelope.
    pub fn is_oscillatory(&self) -> bool {
        self.eigenvalues
            .iter()
            .any(|z| z.im.abs() > IMAGINARY_TOLERANCE)
    }

    /// Keep the leading `k` modes (all of them if `k >= len`).
    pub fn truncate(&self, k: usize) -> Self {
        let k = k.min(self.len());
        Self {
            timescales: self.timescales[..k].to_vec(),
            amplitudes: self.amplitudes[..k].to_vec(),
            eigenvalues: self.eigenvalues[..k].to_vec(),
            spectral_amplitudes: self.spectral_amplitudes[..k].to_vec(),
            tau: self.tau,
        }
    }

    /// `(timescale, amplitude)` pairs in mode order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.timescales
            .iter()
            .copied()
            .zip(self.amplitudes.iter().copied())
    }

    /// Sum of all amplitudes: the function value at `t = 0`.
    pub fn initial_value(&self) -> f64 {
        self.spectral_amplitudes.iter().sum::<Complex64>().re
    }

    /// `f(t) = Re Σ_i a_i λ_i^(t/τ)` at each time.
    ///
    /// Exact, oscillations included.
    pub fn evaluate(&self, times: &[f64]) -> Result<Vec<f64>> {
        check_times(times)?;
        Ok(spectral_sum(
            &self.eigenvalues,
            &self.spectral_amplitudes,
            times,
            self.tau,
        ))
    }

    /// `f(t) = Σ_i a_i exp(-t / t_i)` at each time.
    ///
    /// Agrees with [`evaluate`](Self::evaluate) when every eigenvalue is real
    /// and non-negative.
    pub fn evaluate_from_timescales(&self, times: &[f64]) -> Result<Vec<f64>> {
        check_times(times)?;
        Ok(envelope_sum(&self.timescales, &self.amplitudes, times))
    }
}

/// Fingerprint of the (cross-)correlation `E_μ[obs1(0) obs2(t)]`.
///
/// `obs2 = None` gives the autocorrelation of `obs1`.
pub fn correlation_fingerprint(
    decomposition: &Decomposition,
    obs1: &[f64],
    obs2: Option<&[f64]>,
    tau: f64,
) -> Result<Fingerprint> {
    check_lag(tau)?;
    let n = decomposition.n_states();
    check_length("obs1", obs1.len(), n)?;
    let obs2 = obs2.unwrap_or(obs1);
    check_length("obs2", obs2.len(), n)?;

    let mu = decomposition.stationary_distribution();
    let weights = mu.component_mul(&DVector::from_column_slice(obs1));
    let amplitudes = amplitudes(decomposition, &weights, &DVector::from_column_slice(obs2));

    Fingerprint::from_spectrum(decomposition.eigenvalues().iter().copied().collect(), amplitudes, tau)
}

/// Fingerprint of the relaxation `E_p0[obs(t)]`.
///
/// `p0` need not be normalized; the result scales linearly with it.
pub fn relaxation_fingerprint(
    decomposition: &Decomposition,
    p0: &[f64],
    obs: &[f64],
    tau: f64,
) -> Result<Fingerprint> {
    check_lag(tau)?;
    let n = decomposition.n_states();
    check_length("p0", p0.len(), n)?;
    check_length("obs", obs.len(), n)?;

    let amplitudes = amplitudes(
        decomposition,
        &DVector::from_column_slice(p0),
        &DVector::from_column_slice(obs),
    );

    Fingerprint::from_spectrum(decomposition.eigenvalues().iter().copied().collect(), amplitudes, tau)
}

/// `a_i = (weights · r_i) (l_i · observable)`, plain (unconjugated) products.
fn amplitudes(
    decomposition: &Decomposition,
    weights: &DVector<f64>,
    observable: &DVector<f64>,
) -> Vec<Complex64> {
    let projected = decomposition.right().tr_mul(&to_complex(weights));
    let overlap = decomposition.left() * to_complex(observable);
    projected.component_mul(&overlap).iter().copied().collect()
}
