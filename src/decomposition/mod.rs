//! RDL decomposition: right eigenvectors, diagonal of eigenvalues, left
//! eigenvectors.
//!
//! The decomposition satisfies `T R = R D`, `L T = D L` and `L R = I`, with
//! modes in descending eigenvalue modulus and the stationary mode first.
//!
//! - **Dense** ([`dense`]): full spectrum from the real Schur form (standard
//!   norm) or the symmetrized matrix (reversible norm); truncation slices it.
//! - **Sparse** ([`sparse`]): only the k leading modes, via Arnoldi (standard
//!   norm) or Lanczos on the symmetrized operator (reversible norm). The
//!   matrix is only touched through matrix-vector products.
//!
//! A chain in detailed balance takes the symmetric route under both norms;
//! the standard norm then only rescales the vectors ([`standardize`]).
//!
//! Under both norms `l_1 = μ` and `r_1 = 1`; the reversible norm additionally
//! gives `l_i = μ ⊙ r_i`.

pub mod dense;
pub mod eigen;
pub mod krylov;
pub mod sparse;

use nalgebra::{DMatrix, DVector};

use crate::constants::{
    BIORTHOGONALITY_TOLERANCE, EIGEN_RESIDUAL_TOLERANCE, IMAGINARY_TOLERANCE,
    STATIONARY_EIGENVALUE_TOLERANCE,
};
use crate::config::Config;
use crate::error::{DecompositionError, FingerprintError, Result};
use crate::operator::{detailed_balance_violation, TransitionOperator};
use crate::types::{CMatrix, CVector, Complex64, Norm};

/// Right/left eigenvector bases and eigenvalues of a transition matrix.
#[derive(Debug, Clone)]
pub struct Decomposition {
    right: CMatrix,
    eigenvalues: CVector,
    left: CMatrix,
    norm: Norm,
}

impl Decomposition {
    pub(crate) fn new(right: CMatrix, mut eigenvalues: CVector, left: CMatrix, norm: Norm) -> Self {
        pin_stationary(eigenvalues.as_mut_slice());
        Self {
            right,
            eigenvalues,
            left,
            norm,
        }
    }

    /// Right eigenvectors as columns (n x m).
    pub fn right(&self) -> &CMatrix {
        &self.right
    }

    /// Left eigenvectors as rows (m x n).
    pub fn left(&self) -> &CMatrix {
        &self.left
    }

    /// Eigenvalues in mode order.
    pub fn eigenvalues(&self) -> &CVector {
        &self.eigenvalues
    }

    /// Eigenvalues as a diagonal matrix D.
    pub fn diagonal(&self) -> CMatrix {
        CMatrix::from_diagonal(&self.eigenvalues)
    }

    /// Normalization the bases were built with (never [`Norm::Auto`]).
    pub fn norm(&self) -> Norm {
        self.norm
    }

    /// Number of states n.
    pub fn n_states(&self) -> usize {
        self.right.nrows()
    }

    /// Number of retained modes m.
    pub fn n_modes(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Right eigenvector r_i.
    pub fn right_vector(&self, i: usize) -> CVector {
        self.right.column(i).into_owned()
    }

    /// Left eigenvector l_i (as a column vector).
    pub fn left_vector(&self, i: usize) -> CVector {
        self.left.row(i).transpose()
    }

    /// Stationary distribution carried by the first left eigenvector.
    pub fn stationary_distribution(&self) -> DVector<f64> {
        self.left.row(0).transpose().map(|z| z.re)
    }

    /// Keep the leading `k` modes.
    pub fn truncate(&self, k: usize) -> Result<Self> {
        let m = self.n_modes();
        if k == 0 || k > m {
            return Err(DecompositionError::InvalidTruncation { k, n: m }.into());
        }
        Ok(Self {
            right: self.right.columns(0, k).into_owned(),
            eigenvalues: self.eigenvalues.rows(0, k).into_owned(),
            left: self.left.rows(0, k).into_owned(),
            norm: self.norm,
        })
    }

    /// True if every eigenvalue is real (within tolerance).
    pub fn is_real(&self) -> bool {
        self.eigenvalues
            .iter()
            .all(|z| z.im.abs() <= IMAGINARY_TOLERANCE)
    }

    /// Real parts of (R, eigenvalues, L).
    ///
    /// Lossless when [`is_real`](Self::is_real) holds.
    pub fn real_parts(&self) -> (DMatrix<f64>, DVector<f64>, DMatrix<f64>) {
        (
            self.right.map(|z| z.re),
            self.eigenvalues.map(|z| z.re),
            self.left.map(|z| z.re),
        )
    }

    /// `max |(L R - I)_ij|`.
    pub fn biorthogonality_error(&self) -> f64 {
        let m = self.n_modes();
        let product = &self.left * &self.right;
        let identity = CMatrix::identity(m, m);
        (product - identity)
            .iter()
            .map(|z| z.norm())
            .fold(0.0_f64, f64::max)
    }
}

/// Store a leading eigenvalue within [`STATIONARY_EIGENVALUE_TOLERANCE`] of
/// one as exactly `1 + 0i`.
///
/// Every path puts the stationary mode first; rounding in the eigensolver
/// would otherwise leave it at `1 ± ε`, which turns `τ / ln|λ|` into a huge
/// finite timescale of either sign.
pub(crate) fn pin_stationary(values: &mut [Complex64]) {
    if let Some(first) = values.first_mut() {
        if (*first - Complex64::new(1.0, 0.0)).norm() <= STATIONARY_EIGENVALUE_TOLERANCE {
            *first = Complex64::new(1.0, 0.0);
        }
    }
}

/// Reject `k = 0` and `k > n`.
pub(crate) fn check_truncation(k: Option<usize>, n: usize) -> Result<()> {
    match k {
        Some(k) if k == 0 || k > n => Err(DecompositionError::InvalidTruncation { k, n }.into()),
        _ => Ok(()),
    }
}

/// `sqrt(μ)`, which the symmetrization `D^½ T D^-½` needs strictly positive.
pub(crate) fn sqrt_stationary(stationary: &DVector<f64>) -> Result<DVector<f64>> {
    if let Some(i) = stationary.iter().position(|&x| !(x > 0.0)) {
        return Err(FingerprintError::InvalidNormalization {
            reason: format!("stationary probability of state {i} is {}", stationary[i]),
        });
    }
    Ok(stationary.map(f64::sqrt))
}

/// Bases from orthonormal eigenvectors U of the symmetrized matrix:
/// `R = D^-½ U`, `L = Uᵀ D^½`.
///
/// The stationary eigenvector of `D^½ T D^-½` is `sqrt(μ)` itself (unit
/// norm since Σμ = 1), so u_1 is replaced by it: `r_1 = 1` and `l_1 = μ`
/// hold exactly instead of to the eigensolver's accuracy, which matters for
/// states whose `sqrt(μ)` is below that accuracy.
pub(crate) fn from_symmetric(
    values: &[f64],
    vectors: &DMatrix<f64>,
    sqrt_stationary: &DVector<f64>,
) -> Decomposition {
    let n = vectors.nrows();
    let m = values.len();
    let mut u = vectors.clone();
    let stationary_first = values
        .first()
        .is_some_and(|&x| (x - 1.0).abs() <= STATIONARY_EIGENVALUE_TOLERANCE);
    if stationary_first {
        u.set_column(0, &(sqrt_stationary / sqrt_stationary.norm()));
    } else if m > 0 && u.column(0).sum() < 0.0 {
        u.column_mut(0).neg_mut();
    }

    let right = CMatrix::from_fn(n, m, |i, j| Complex64::new(u[(i, j)] / sqrt_stationary[i], 0.0));
    let left = CMatrix::from_fn(m, n, |i, j| Complex64::new(u[(j, i)] * sqrt_stationary[j], 0.0));
    let eigenvalues = CVector::from_iterator(m, values.iter().map(|&x| Complex64::new(x, 0.0)));

    Decomposition::new(right, eigenvalues, left, Norm::Reversible)
}

/// Standard-norm bases from reversible ones: every non-stationary right
/// vector rescaled to unit length and its left partner by the inverse
/// factor, the scaling the Schur and Arnoldi routes produce.
///
/// A chain in detailed balance takes this route under the standard norm:
/// its right eigenvectors span as many orders of magnitude as μ does, and
/// inverting them (or pairing two Krylov runs) loses the small-μ states.
pub(crate) fn standardize(reversible: Decomposition) -> Decomposition {
    let Decomposition {
        mut right,
        eigenvalues,
        mut left,
        ..
    } = reversible;
    for i in 1..right.ncols() {
        let scale = right.column(i).norm();
        if scale > 0.0 {
            right.column_mut(i).unscale_mut(scale);
            left.row_mut(i).scale_mut(scale);
        }
    }
    Decomposition::new(right, eigenvalues, left, Norm::Standard)
}

/// True if μ is strictly positive and the chain satisfies detailed balance
/// with it to `reversibility_tolerance`.
pub(crate) fn in_detailed_balance<T: TransitionOperator + ?Sized>(
    operator: &T,
    stationary: &DVector<f64>,
    config: &Config,
) -> bool {
    stationary.iter().all(|&x| x > 0.0)
        && detailed_balance_violation(operator, stationary) <= config.reversibility_tolerance
}

/// Rescale the stationary pair so that `l_1` sums to one (`l_1 = μ`, `r_1 = 1`).
pub(crate) fn normalize_stationary(
    right: &mut CMatrix,
    left: &mut CMatrix,
) -> std::result::Result<(), DecompositionError> {
    let total: Complex64 = left.row(0).iter().sum();
    if total.norm() == 0.0 || !total.is_finite() {
        return Err(DecompositionError::SingularBasis {
            reason: "stationary left eigenvector sums to zero",
        });
    }
    for z in right.column_mut(0).iter_mut() {
        *z *= total;
    }
    for z in left.row_mut(0).iter_mut() {
        *z /= total;
    }
    Ok(())
}

/// Drop rounding-level imaginary parts of vectors belonging to real eigenvalues.
pub(crate) fn clean_real_modes(values: &[Complex64], right: &mut CMatrix, left: &mut CMatrix) {
    for (i, lambda) in values.iter().enumerate() {
        if lambda.im == 0.0 {
            for z in right.column_mut(i).iter_mut() {
                z.im = 0.0;
            }
            for z in left.row_mut(i).iter_mut() {
                z.im = 0.0;
            }
        }
    }
}

/// Fail if `L R` is too far from the identity to be a usable basis.
pub(crate) fn check_biorthogonality(decomposition: &Decomposition) -> Result<()> {
    let error = decomposition.biorthogonality_error();
    tracing::debug!(
        modes = decomposition.n_modes(),
        norm = decomposition.norm().description(),
        error,
        "biorthogonality check"
    );
    if !(error <= BIORTHOGONALITY_TOLERANCE) {
        return Err(DecompositionError::SingularBasis {
            reason: "left and right bases are not biorthogonal",
        }
        .into());
    }
    Ok(())
}

/// Fail if some retained mode is not an eigenpair of `operator`.
///
/// Biorthogonality alone holds for any basis built as `L = R⁻¹`, so this
/// checks `T r_i = λ_i r_i` in the μ-weighted norm and `l_i T = λ_i l_i` in
/// the 1/μ-weighted norm, relative to the vector's own norm. These are the
/// norms in which a reversible chain is symmetric, so states with tiny
/// stationary mass neither dominate nor vanish. Falls back to uniform
/// weights if μ has a non-positive entry.
pub(crate) fn check_residuals<T: TransitionOperator + ?Sized>(
    operator: &T,
    decomposition: &Decomposition,
    stationary: &DVector<f64>,
) -> Result<()> {
    let weights = if stationary.iter().all(|&x| x > 0.0) {
        stationary.clone()
    } else {
        DVector::from_element(stationary.len(), 1.0)
    };
    let inverse_weights = weights.map(|w| 1.0 / w);

    let mut worst = 0.0_f64;
    for (i, &lambda) in decomposition.eigenvalues().iter().enumerate() {
        let right = decomposition.right_vector(i);
        let image = apply_complex(&right, |x| operator.matvec(x));
        let right_residual = weighted_norm(&(image - right.map(|z| z * lambda)), &weights)
            / weighted_norm(&right, &weights);

        let left = decomposition.left_vector(i);
        let image = apply_complex(&left, |x| operator.matvec_transpose(x));
        let left_residual = weighted_norm(&(image - left.map(|z| z * lambda)), &inverse_weights)
            / weighted_norm(&left, &inverse_weights);

        worst = worst.max(right_residual).max(left_residual);
        if !(right_residual <= EIGEN_RESIDUAL_TOLERANCE && left_residual <= EIGEN_RESIDUAL_TOLERANCE) {
            tracing::warn!(mode = i, right_residual, left_residual, "eigenpair residual too large");
            return Err(DecompositionError::SingularBasis {
                reason: "basis vectors are not eigenvectors of the transition matrix",
            }
            .into());
        }
    }
    tracing::debug!(modes = decomposition.n_modes(), worst, "eigen-residual check");
    Ok(())
}

/// A real linear map applied to a complex vector, real and imaginary parts
/// separately.
fn apply_complex<F>(x: &CVector, apply: F) -> CVector
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let re = apply(&x.map(|z| z.re));
    if x.iter().all(|z| z.im == 0.0) {
        return re.map(|v| Complex64::new(v, 0.0));
    }
    let im = apply(&x.map(|z| z.im));
    re.zip_map(&im, Complex64::new)
}

/// `sqrt(Σ w_j |x_j|²)`.
fn weighted_norm(x: &CVector, weights: &DVector<f64>) -> f64 {
    x.iter()
        .zip(weights.iter())
        .map(|(z, w)| w * z.norm_sqr())
        .sum::<f64>()
        .sqrt()
}
