//! Type aliases and common types.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

pub use num_complex::Complex64;

/// Dense complex matrix holding eigenvector bases.
pub type CMatrix = DMatrix<Complex64>;

/// Dense complex vector holding eigenvalues or eigenvectors.
pub type CVector = DVector<Complex64>;

/// Normalization convention for the right/left eigenvector bases.
///
/// Every convention satisfies `L R = I`. They differ in how the freedom to
/// rescale each pair `(r_i, l_i) -> (c r_i, l_i / c)` is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    /// Reversible if the chain satisfies detailed balance, standard otherwise.
    #[default]
    Auto,

    /// `l_1 = μ`, `r_1 = 1`, remaining pairs only biorthonormal.
    Standard,

    /// Standard, and additionally `l_i = μ ⊙ r_i` for every mode.
    ///
    /// Computed through the symmetrized matrix `D^½ T D^-½`. On a chain that
    /// violates detailed balance the result is silently wrong; checking that
    /// is the caller's job (or use [`Norm::Auto`]).
    Reversible,
}

impl Norm {
    /// Human-readable name for logs.
    pub fn description(&self) -> &'static str {
        match self {
            Norm::Auto => "auto",
            Norm::Standard => "standard",
            Norm::Reversible => "reversible",
        }
    }
}

/// Promote a real vector to a complex one.
pub(crate) fn to_complex(v: &DVector<f64>) -> CVector {
    v.map(|x| Complex64::new(x, 0.0))
}
