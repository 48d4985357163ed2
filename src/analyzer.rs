//! Main `SpectralAnalyzer` entry point and builder.

use nalgebra::DVector;

use crate::analysis::{
    check_times, correlation_fingerprint, propagate, relaxation_fingerprint,
    stationary_expectation, timescales::check_lag, timescales_from_eigenvalues, Fingerprint,
};
use crate::config::Config;
use crate::decomposition::{check_truncation, Decomposition};
use crate::error::{DecompositionError, Result};
use crate::math::is_integer;
use crate::operator::{
    check_length, check_square, check_stochastic, detailed_balance_violation, is_irreducible,
    resolve_norm, TransitionOperator,
};
use crate::types::{Complex64, Norm};

/// Main entry point for spectral analysis of a transition matrix.
///
/// Every method validates its input, derives the stationary distribution
/// and decomposes the matrix afresh; nothing is cached between calls.
///
/// # Example
///
/// ```ignore
/// use markov_fingerprint::SpectralAnalyzer;
///
/// let fp = SpectralAnalyzer::new()
///     .seed(7)
///     .fingerprint_correlation(&t, &obs, None, Some(4), 7.5)?;
/// for (timescale, amplitude) in fp.iter() {
///     println!("{timescale:>10.2} {amplitude:+.4}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpectralAnalyzer {
    config: Config,
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-call facts about the chain.
struct Chain {
    n: usize,
    stationary: DVector<f64>,
}

impl SpectralAnalyzer {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create with an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Analyzer using [`Config::strict`].
    pub fn strict() -> Self {
        Self::with_config(Config::strict())
    }

    /// Analyzer using [`Config::fast`].
    pub fn fast() -> Self {
        Self::with_config(Config::fast())
    }

    /// Enable or disable input validation.
    pub fn validate_input(mut self, validate: bool) -> Self {
        self.config.validate_input = validate;
        self
    }

    /// Set the detailed-balance tolerance used by [`Norm::Auto`].
    pub fn reversibility_tolerance(mut self, tolerance: f64) -> Self {
        self.config.reversibility_tolerance = tolerance;
        self
    }

    /// Set the Krylov subspace dimension.
    pub fn krylov_dim(mut self, dim: usize) -> Self {
        self.config.krylov_dim = Some(dim);
        self
    }

    /// Set the Ritz residual tolerance.
    pub fn krylov_tolerance(mut self, tolerance: f64) -> Self {
        self.config.krylov_tolerance = tolerance;
        self
    }

    /// Set the maximum number of Krylov restarts.
    pub fn max_restarts(mut self, restarts: usize) -> Self {
        self.config.max_restarts = restarts;
        self
    }

    /// Set the seed for Krylov start vectors.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Chain properties
    // =========================================================================

    /// Stationary distribution μ (`μ T = μ`, `Σ μ = 1`).
    pub fn stationary_distribution<T>(&self, t: &T) -> Result<DVector<f64>>
    where
        T: TransitionOperator + ?Sized,
    {
        Ok(self.prepare(t)?.stationary)
    }

    /// True if the chain satisfies detailed balance within
    /// [`Config::reversibility_tolerance`].
    pub fn is_reversible<T>(&self, t: &T) -> Result<bool>
    where
        T: TransitionOperator + ?Sized,
    {
        let chain = self.prepare(t)?;
        let violation = detailed_balance_violation(t, &chain.stationary);
        Ok(violation <= self.config.reversibility_tolerance)
    }

    /// Stationary expectation `⟨obs⟩_μ`.
    pub fn expectation<T>(&self, t: &T, obs: &[f64]) -> Result<f64>
    where
        T: TransitionOperator + ?Sized,
    {
        let chain = self.prepare(t)?;
        stationary_expectation(&chain.stationary, obs)
    }

    // =========================================================================
    // Spectrum
    // =========================================================================

    /// RDL decomposition of `t`, truncated to `k` modes.
    ///
    /// Sparse matrices require `k`.
    pub fn rdl_decomposition<T>(&self, t: &T, k: Option<usize>, norm: Norm) -> Result<Decomposition>
    where
        T: TransitionOperator + ?Sized,
    {
        let chain = self.prepare(t)?;
        check_truncation(k, chain.n)?;
        self.decompose(t, k, norm, &chain)
    }

    /// Leading eigenvalues in descending modulus.
    ///
    /// Sparse matrices require `k`.
    pub fn eigenvalues<T>(&self, t: &T, k: Option<usize>) -> Result<Vec<Complex64>>
    where
        T: TransitionOperator + ?Sized,
    {
        let chain = self.prepare(t)?;
        check_truncation(k, chain.n)?;
        let norm = resolve_norm(t, Norm::Auto, &chain.stationary, &self.config);
        t.spectrum(k, norm, &chain.stationary, &self.config)
    }

    /// Implied timescales `-τ / ln|λ_i|` of the leading `k` modes.
    pub fn timescales<T>(&self, t: &T, tau: f64, k: Option<usize>) -> Result<Vec<f64>>
    where
        T: TransitionOperator + ?Sized,
    {
        check_lag(tau)?;
        let eigenvalues = self.eigenvalues(t, k)?;
        timescales_from_eigenvalues(&eigenvalues, tau)
    }

    // =========================================================================
    // Fingerprints
    // =========================================================================

    /// Timescales and amplitudes of the correlation of `obs1` and `obs2`
    /// (autocorrelation of `obs1` when `obs2` is `None`).
    pub fn fingerprint_correlation<T>(
        &self,
        t: &T,
        obs1: &[f64],
        obs2: Option<&[f64]>,
        k: Option<usize>,
        tau: f64,
    ) -> Result<Fingerprint>
    where
        T: TransitionOperator + ?Sized,
    {
        check_lag(tau)?;
        let chain = self.prepare(t)?;
        check_observables(chain.n, obs1, obs2)?;
        check_truncation(k, chain.n)?;

        let decomposition = self.decompose(t, k, Norm::Auto, &chain)?;
        correlation_fingerprint(&decomposition, obs1, obs2, tau)
    }

    /// Timescales and amplitudes of the relaxation of `obs` from `p0`.
    pub fn fingerprint_relaxation<T>(
        &self,
        t: &T,
        p0: &[f64],
        obs: &[f64],
        k: Option<usize>,
        tau: f64,
    ) -> Result<Fingerprint>
    where
        T: TransitionOperator + ?Sized,
    {
        check_lag(tau)?;
        let chain = self.prepare(t)?;
        check_length("p0", p0.len(), chain.n)?;
        check_length("obs", obs.len(), chain.n)?;
        check_truncation(k, chain.n)?;

        let decomposition = self.decompose(t, k, Norm::Auto, &chain)?;
        relaxation_fingerprint(&decomposition, p0, obs, tau)
    }

    // =========================================================================
    // Time-domain functions
    // =========================================================================

    /// Correlation `E_μ[obs1(0) obs2(t)]` at each time (in steps of T).
    ///
    /// Without truncation, small integer times are propagated directly;
    /// otherwise the spectral sum of the fingerprint is evaluated.
    ///
    /// Direct propagation costs one matrix-vector product per step up to the
    /// largest time. A sparse matrix with `k = None` always propagates, and
    /// fails with [`DecompositionError::TruncationRequired`] for times beyond
    /// [`MAX_PROPAGATION_STEPS`](crate::MAX_PROPAGATION_STEPS);
    /// pass a `k` for long horizons.
    pub fn correlation<T>(
        &self,
        t: &T,
        obs1: &[f64],
        obs2: Option<&[f64]>,
        times: &[f64],
        k: Option<usize>,
    ) -> Result<Vec<f64>>
    where
        T: TransitionOperator + ?Sized,
    {
        check_times(times)?;
        let chain = self.prepare(t)?;
        check_observables(chain.n, obs1, obs2)?;
        check_truncation(k, chain.n)?;

        if propagates(t, k, times, chain.n) {
            let weights = chain
                .stationary
                .component_mul(&DVector::from_column_slice(obs1));
            let observable = DVector::from_column_slice(obs2.unwrap_or(obs1));
            return propagate(t, &weights, &observable, times);
        }

        let decomposition = self.decompose(t, k, Norm::Auto, &chain)?;
        correlation_fingerprint(&decomposition, obs1, obs2, 1.0)?.evaluate(times)
    }

    /// Relaxation `E_p0[obs(t)]` at each time (in steps of T).
    ///
    /// Routes as [`correlation`](Self::correlation) does, with the same step
    /// budget on direct propagation.
    pub fn relaxation<T>(
        &self,
        t: &T,
        p0: &[f64],
        obs: &[f64],
        times: &[f64],
        k: Option<usize>,
    ) -> Result<Vec<f64>>
    where
        T: TransitionOperator + ?Sized,
    {
        check_times(times)?;
        let chain = self.prepare(t)?;
        check_length("p0", p0.len(), chain.n)?;
        check_length("obs", obs.len(), chain.n)?;
        check_truncation(k, chain.n)?;

        if propagates(t, k, times, chain.n) {
            let weights = DVector::from_column_slice(p0);
            let observable = DVector::from_column_slice(obs);
            return propagate(t, &weights, &observable, times);
        }

        let decomposition = self.decompose(t, k, Norm::Auto, &chain)?;
        relaxation_fingerprint(&decomposition, p0, obs, 1.0)?.evaluate(times)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Validate `t` and derive its stationary distribution.
    fn prepare<T>(&self, t: &T) -> Result<Chain>
    where
        T: TransitionOperator + ?Sized,
    {
        self.config.validate()?;
        let n = check_square(t)?;
        if self.config.validate_input {
            check_stochastic(t, self.config.row_sum_tolerance)?;
        }
        if !is_irreducible(t) {
            return Err(DecompositionError::Reducible.into());
        }
        let stationary = t.stationary_distribution(&self.config)?;
        Ok(Chain { n, stationary })
    }

    fn decompose<T>(&self, t: &T, k: Option<usize>, norm: Norm, chain: &Chain) -> Result<Decomposition>
    where
        T: TransitionOperator + ?Sized,
    {
        let norm = resolve_norm(t, norm, &chain.stationary, &self.config);
        tracing::debug!(
            n = chain.n,
            k = k.unwrap_or(chain.n),
            norm = norm.description(),
            dense = t.supports_full_decomposition(),
            "decomposing transition matrix"
        );
        t.decompose(k, norm, &chain.stationary, &self.config)
    }
}

/// Direct propagation is used for untruncated requests: always on sparse
/// matrices, and on dense ones when every time is a whole step below `n`.
fn propagates<T>(t: &T, k: Option<usize>, times: &[f64], n: usize) -> bool
where
    T: TransitionOperator + ?Sized,
{
    if k.is_some() {
        return false;
    }
    if !t.supports_full_decomposition() {
        return true;
    }
    times.iter().all(|&x| is_integer(x) && x < n as f64)
}

fn check_observables(n: usize, obs1: &[f64], obs2: Option<&[f64]>) -> Result<()> {
    check_length("obs1", obs1.len(), n)?;
    if let Some(obs2) = obs2 {
        check_length("obs2", obs2.len(), n)?;
    }
    Ok(())
}
