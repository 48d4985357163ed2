//! Spectral analysis built on a [`Decomposition`](crate::Decomposition).
//!
//! 1. **Timescales** ([`timescales`]): eigenvalues to implied relaxation times
//! 2. **Expectation** ([`expectation`]): stationary averages of observables
//! 3. **Fingerprints** ([`fingerprint`]): timescale/amplitude pairs of
//!    correlation and relaxation functions
//! 4. **Evaluation** ([`evaluate`], [`propagation`]): the functions themselves
//!    at explicit observation times, by spectral sum or direct propagation

pub mod evaluate;
pub mod expectation;
pub mod fingerprint;
pub mod propagation;
pub mod timescales;

pub use evaluate::check_times;
pub use expectation::stationary_expectation;
pub use fingerprint::{correlation_fingerprint, relaxation_fingerprint, Fingerprint};
pub use propagation::propagate;
pub use timescales::{implied_timescale, timescales_from_eigenvalues};
