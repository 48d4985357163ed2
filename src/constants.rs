//! Numerical constants used throughout the crate.

/// Default deterministic seed for Krylov start vectors.
///
/// Same seed + same matrix = same decomposition, including eigenvector
/// signs. The value `0x6D61726B6F76` is "markov" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x6D61726B6F76;

/// Eigenvalues with `|λ| >= 1 -` this value get an infinite timescale.
pub const UNIT_MODULUS_TOLERANCE: f64 = 1e-14;

/// A leading eigenvalue this close to one is the stationary mode; it is
/// stored as exactly `1 + 0i`. Farther away, a sparse chain is reducible.
pub const STATIONARY_EIGENVALUE_TOLERANCE: f64 = 1e-8;

/// Imaginary parts below this magnitude count as a real spectrum.
pub const IMAGINARY_TOLERANCE: f64 = 1e-8;

// =============================================================================
// Dense eigensolver
// =============================================================================

/// Iteration cap for the real Schur and symmetric QR iterations.
pub const SCHUR_MAX_ITERATIONS: usize = 10_000;

/// Relative offset applied to an eigenvalue before shifted inverse iteration,
/// so the shifted system stays numerically non-singular.
pub const INVERSE_ITERATION_SHIFT: f64 = 1e-10;

/// Number of shifted inverse iteration sweeps per eigenvector.
pub const INVERSE_ITERATIONS: usize = 4;

/// Eigenvalues closer than this (relative) are treated as one cluster and
/// their eigenvectors are orthogonalized against each other.
pub const EIGENVALUE_CLUSTER_TOLERANCE: f64 = 1e-8;

/// Components within this relative distance of the largest magnitude tie
/// for the sign pivot of an eigenvector; the first of them is made positive.
pub const SIGN_PIVOT_TOLERANCE: f64 = 1e-8;

/// Maximum admissible `max |L R - I|` before a basis is rejected as singular.
pub const BIORTHOGONALITY_TOLERANCE: f64 = 1e-6;

/// Maximum admissible relative eigen-residual of a standard-norm basis,
/// `‖T r_i - λ_i r_i‖_μ / ‖r_i‖_μ` and `‖l_i T - λ_i l_i‖_μ⁻¹ / ‖l_i‖_μ⁻¹`.
pub const EIGEN_RESIDUAL_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Propagation
// =============================================================================

/// Largest number of matrix-vector steps the direct propagation route takes.
///
/// Beyond it a dense matrix falls back to the spectral route and a sparse
/// matrix needs a truncation `k`.
pub const MAX_PROPAGATION_STEPS: usize = 100_000;

// =============================================================================
// Default configuration constants
// =============================================================================

/// Default tolerance on `|Σ_j T_ij - 1|` during input validation.
pub const DEFAULT_ROW_SUM_TOLERANCE: f64 = 1e-10;

/// Default absolute tolerance on `|μ_i T_ij - μ_j T_ji|` for detailed balance.
pub const DEFAULT_REVERSIBILITY_TOLERANCE: f64 = 1e-12;

/// Default relative residual tolerance for Ritz pairs.
pub const DEFAULT_KRYLOV_TOLERANCE: f64 = 1e-12;

/// Default number of thick restarts before reporting non-convergence.
pub const DEFAULT_MAX_RESTARTS: usize = 300;

/// Lower bound on the automatic Krylov subspace dimension.
pub const MIN_KRYLOV_DIM: usize = 30;
