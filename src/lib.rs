//! # markov-fingerprint
//!
//! Spectral fingerprints of Markov chains.
//!
//! Given a row-stochastic transition matrix T, this crate decomposes
//! equilibrium correlation functions and non-equilibrium relaxation functions
//! of observables into relaxation timescales and amplitudes:
//!
//! ```text
//! f(t) = Σ_i a_i exp(-t / t_i),    t_i = -τ / ln|λ_i|
//! ```
//!
//! - Dense matrices (`nalgebra::DMatrix<f64>`) use the full eigendecomposition
//! - Sparse matrices (`nalgebra_sparse::CsrMatrix<f64>`) use Krylov
//!   iteration for the k leading modes and never densify
//!
//! ## Quick Start
//!
//! ```ignore
//! use markov_fingerprint::{fingerprint_correlation, correlation};
//!
//! // Autocorrelation of an indicator observable, four slowest modes.
//! let fp = fingerprint_correlation(&t, &obs, None, Some(4), 7.5)?;
//! for (timescale, amplitude) in fp.iter() {
//!     println!("t = {timescale:.1}, a = {amplitude:.4}");
//! }
//!
//! // The same function at explicit times (in steps of T).
//! let values = correlation(&t, &obs, None, &[1.0, 5.0, 10.0], Some(4))?;
//! ```
//!
//! ## Normalization
//!
//! Every decomposition satisfies `L R = I` with `l_1 = μ` and `r_1 = 1`.
//! [`Norm::Reversible`] additionally gives `l_i = μ ⊙ r_i`; [`Norm::Auto`]
//! picks it when the chain satisfies detailed balance.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod analyzer;
mod api;
mod config;
mod constants;
mod error;
mod math;
mod types;

// Functional modules
pub mod analysis;
pub mod decomposition;
pub mod operator;

// Re-exports for public API
pub use analysis::Fingerprint;
pub use analyzer::SpectralAnalyzer;
pub use api::{
    correlation, eigenvalues, expectation, fingerprint_correlation, fingerprint_relaxation,
    is_reversible, rdl_decomposition, relaxation, stationary_distribution, timescales,
};
pub use config::Config;
pub use constants::{DEFAULT_SEED, MAX_PROPAGATION_STEPS, UNIT_MODULUS_TOLERANCE};
pub use decomposition::Decomposition;
pub use error::{DecompositionError, FingerprintError, Result, ShapeError};
pub use operator::TransitionOperator;
pub use types::{CMatrix, CVector, Complex64, Norm};
