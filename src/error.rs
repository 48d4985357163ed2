//! Error types for spectral analysis.
//!
//! Every entry point fails synchronously with a [`FingerprintError`] naming the
//! violated contract; no partial or NaN-filled result is ever returned.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FingerprintError>;

/// Top-level error returned by every public operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FingerprintError {
    /// A matrix or vector has the wrong shape.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// The eigendecomposition could not be produced.
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),

    /// Reversible normalization is meaningless for this input.
    #[error("reversible normalization unavailable: {reason}")]
    InvalidNormalization {
        /// Why the normalization cannot be applied.
        reason: String,
    },

    /// A scalar argument is outside the domain of the computation.
    #[error("{argument} = {value} is outside the valid domain ({requirement})")]
    NumericDomain {
        /// Name of the offending argument.
        argument: &'static str,
        /// The rejected value.
        value: f64,
        /// Human-readable requirement.
        requirement: &'static str,
    },

    /// The matrix is not a valid transition matrix.
    #[error("invalid transition matrix at row {row}: {reason}")]
    InvalidTransitionMatrix {
        /// First offending row.
        row: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Shape contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The transition matrix is not square.
    #[error("transition matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// A vector argument does not match the number of states.
    #[error("{argument} has length {found}, expected {expected}")]
    LengthMismatch {
        /// Name of the offending argument.
        argument: &'static str,
        /// Number of states.
        expected: usize,
        /// Actual length.
        found: usize,
    },
}

/// Failures of the decomposition engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecompositionError {
    /// Requested truncation is zero or exceeds the number of states.
    #[error("truncation k = {k} must satisfy 1 <= k <= {n}")]
    InvalidTruncation {
        /// Requested number of modes.
        k: usize,
        /// Number of states.
        n: usize,
    },

    /// An iterative eigensolver did not reach the requested tolerance.
    #[error("eigensolver did not converge after {iterations} iterations (residual {residual:.3e})")]
    NotConverged {
        /// Iterations (restarts) performed.
        iterations: usize,
        /// Largest remaining residual.
        residual: f64,
    },

    /// The chain is not irreducible, so the stationary distribution is not unique.
    #[error("transition matrix is reducible: stationary distribution is not unique")]
    Reducible,

    /// The eigenvector basis is singular (defective matrix or unmatched bases).
    #[error("eigenvector basis is singular: {reason}")]
    SingularBasis {
        /// Where the basis broke down.
        reason: &'static str,
    },

    /// Sparse decompositions only compute a leading subset of modes.
    #[error("sparse decomposition requires an explicit number of modes k")]
    TruncationRequired,
}
