//! Configuration for spectral analysis.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_KRYLOV_TOLERANCE, DEFAULT_MAX_RESTARTS, DEFAULT_REVERSIBILITY_TOLERANCE,
    DEFAULT_ROW_SUM_TOLERANCE, DEFAULT_SEED, MIN_KRYLOV_DIM,
};
use crate::error::{FingerprintError, Result};

/// Configuration options for [`SpectralAnalyzer`](crate::SpectralAnalyzer).
///
/// The defaults reproduce the behavior of the free functions
/// ([`crate::correlation`], [`crate::timescales`], ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // =========================================================================
    // Input validation
    // =========================================================================

    /// Check non-negativity and row sums before every computation.
    ///
    /// Default: true.
    pub validate_input: bool,

    /// Maximum deviation of a row sum from one.
    ///
    /// Default: 1e-10.
    pub row_sum_tolerance: f64,

    /// Absolute tolerance on detailed balance `μ_i T_ij = μ_j T_ji`.
    ///
    /// Used by [`Norm::Auto`](crate::Norm::Auto) to decide whether the chain is
    /// reversible. Default: 1e-12.
    pub reversibility_tolerance: f64,

    // =========================================================================
    // Krylov eigensolver (sparse path)
    // =========================================================================

    /// Krylov subspace dimension.
    ///
    /// `None` picks `min(n, max(2k + 1, 20))`. Larger subspaces converge in
    /// fewer restarts at a higher cost per restart.
    ///
    /// Default: None.
    pub krylov_dim: Option<usize>,

    /// Relative residual `‖T x - θ x‖ / max(1, |θ|)` a Ritz pair must reach.
    ///
    /// Default: 1e-12.
    pub krylov_tolerance: f64,

    /// Explicit restarts before giving up with
    /// [`DecompositionError::NotConverged`](crate::DecompositionError::NotConverged).
    ///
    /// Default: 300.
    pub max_restarts: usize,

    /// Seed for the Krylov start vectors and inverse iteration.
    ///
    /// Default: [`DEFAULT_SEED`].
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            validate_input: true,
            row_sum_tolerance: DEFAULT_ROW_SUM_TOLERANCE,
            reversibility_tolerance: DEFAULT_REVERSIBILITY_TOLERANCE,

            krylov_dim: None,
            krylov_tolerance: DEFAULT_KRYLOV_TOLERANCE,
            max_restarts: DEFAULT_MAX_RESTARTS,
            seed: DEFAULT_SEED,
        }
    }
}

impl Config {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight tolerances for reference computations.
    ///
    /// - row sums within 1e-13
    /// - Ritz residuals below 1e-14
    /// - 1,000 restarts
    pub fn strict() -> Self {
        Self {
            row_sum_tolerance: 1e-13,
            krylov_tolerance: 1e-14,
            max_restarts: 1_000,
            ..Default::default()
        }
    }

    /// Skip input validation and accept looser Ritz residuals.
    ///
    /// For large sparse chains already known to be stochastic.
    pub fn fast() -> Self {
        Self {
            validate_input: false,
            krylov_tolerance: 1e-10,
            max_restarts: 100,
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Enable or disable input validation.
    pub fn validate_input(mut self, validate: bool) -> Self {
        self.validate_input = validate;
        self
    }

    /// Set the row-sum tolerance.
    pub fn row_sum_tolerance(mut self, tolerance: f64) -> Self {
        assert!(tolerance > 0.0, "row_sum_tolerance must be positive");
        self.row_sum_tolerance = tolerance;
        self
    }

    /// Set the detailed-balance tolerance.
    pub fn reversibility_tolerance(mut self, tolerance: f64) -> Self {
        assert!(tolerance >= 0.0, "reversibility_tolerance must be non-negative");
        self.reversibility_tolerance = tolerance;
        self
    }

    /// Set the Krylov subspace dimension.
    pub fn krylov_dim(mut self, dim: usize) -> Self {
        assert!(dim > 0, "krylov_dim must be positive");
        self.krylov_dim = Some(dim);
        self
    }

    /// Set the Ritz residual tolerance.
    pub fn krylov_tolerance(mut self, tolerance: f64) -> Self {
        assert!(tolerance > 0.0, "krylov_tolerance must be positive");
        self.krylov_tolerance = tolerance;
        self
    }

    /// Set the maximum number of Krylov restarts.
    pub fn max_restarts(mut self, restarts: usize) -> Self {
        self.max_restarts = restarts;
        self
    }

    /// Set the seed for start vectors.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // =========================================================================
    // Resolution methods
    // =========================================================================

    /// Krylov subspace dimension for `k` wanted modes of an `n`-state chain.
    ///
    /// Always within `[k, n]`, and at least `k + 2` whenever `n` allows, so a
    /// thick restart keeps every wanted mode and still has room to grow.
    pub fn resolve_krylov_dim(&self, k: usize, n: usize) -> usize {
        let requested = self
            .krylov_dim
            .unwrap_or_else(|| (2 * k + 1).max(MIN_KRYLOV_DIM));
        requested.max(k + 2).min(n).max(k)
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        if !(self.row_sum_tolerance > 0.0) {
            return Err(FingerprintError::Config(
                "row_sum_tolerance must be positive".to_string(),
            ));
        }
        if !(self.reversibility_tolerance >= 0.0) {
            return Err(FingerprintError::Config(
                "reversibility_tolerance must be non-negative".to_string(),
            ));
        }
        if !(self.krylov_tolerance > 0.0) {
            return Err(FingerprintError::Config(
                "krylov_tolerance must be positive".to_string(),
            ));
        }
        if self.krylov_dim == Some(0) {
            return Err(FingerprintError::Config(
                "krylov_dim must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
