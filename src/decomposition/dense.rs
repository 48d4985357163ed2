//! Full decomposition of a dense transition matrix.

use nalgebra::{DMatrix, DVector};

use super::eigen::{general_eigen, general_eigenvalues, symmetric_eigen};
use super::{
    check_biorthogonality, check_residuals, clean_real_modes, from_symmetric,
    in_detailed_balance, normalize_stationary, pin_stationary, sqrt_stationary, standardize,
    Decomposition,
};
use crate::config::Config;
use crate::error::{DecompositionError, Result};
use crate::types::{CVector, Complex64, Norm};

/// RDL decomposition of `matrix`, optionally truncated to `k` modes.
///
/// `norm` must already be resolved (not [`Norm::Auto`]). Under the standard
/// norm a chain that satisfies detailed balance still goes through the
/// symmetrized matrix: its right eigenvectors span many orders of magnitude
/// when μ does, and inverting them loses the small-μ states.
pub fn decompose(
    matrix: &DMatrix<f64>,
    k: Option<usize>,
    norm: Norm,
    stationary: &DVector<f64>,
    config: &Config,
) -> Result<Decomposition> {
    let full = match norm {
        Norm::Reversible => reversible(matrix, stationary)?,
        Norm::Standard | Norm::Auto if in_detailed_balance(matrix, stationary, config) => {
            tracing::debug!(n = matrix.nrows(), "dense standard decomposition via detailed balance");
            standardize(reversible(matrix, stationary)?)
        }
        Norm::Standard | Norm::Auto => standard(matrix, config)?,
    };
    check_biorthogonality(&full)?;

    let decomposition = match k {
        Some(k) => full.truncate(k)?,
        None => full,
    };
    if decomposition.norm() == Norm::Standard {
        check_residuals(matrix, &decomposition, stationary)?;
    }
    Ok(decomposition)
}

/// Eigenvalues in spectral order, optionally truncated to `k`.
pub fn eigenvalues(
    matrix: &DMatrix<f64>,
    k: Option<usize>,
    norm: Norm,
    stationary: &DVector<f64>,
) -> Result<Vec<Complex64>> {
    let mut values = match norm {
        Norm::Reversible => {
            let sqrt_mu = sqrt_stationary(stationary)?;
            symmetric_eigen(&symmetrize(matrix, &sqrt_mu))?
                .values
                .into_iter()
                .map(|x| Complex64::new(x, 0.0))
                .collect()
        }
        Norm::Standard | Norm::Auto => general_eigenvalues(matrix)?,
    };
    pin_stationary(&mut values);
    if let Some(k) = k {
        values.truncate(k);
    }
    Ok(values)
}

/// Stationary distribution by Grassmann-Taksar-Heyman elimination.
///
/// States are censored one at a time from the last; every update adds
/// non-negative terms, so each μ_i keeps full relative accuracy even when
/// μ spans hundreds of orders of magnitude. A state that cannot reach any
/// lower-numbered state leaves a zero pivot: the chain is reducible.
pub fn stationary_distribution(matrix: &DMatrix<f64>) -> Result<DVector<f64>> {
    let n = matrix.nrows();
    let mut a = matrix.clone();

    for k in (1..n).rev() {
        let exit: f64 = (0..k).map(|j| a[(k, j)]).sum();
        if !(exit > 0.0) || !exit.is_finite() {
            return Err(DecompositionError::Reducible.into());
        }
        for i in 0..k {
            a[(i, k)] /= exit;
        }
        for i in 0..k {
            let via = a[(i, k)];
            if via == 0.0 {
                continue;
            }
            for j in 0..k {
                a[(i, j)] += via * a[(k, j)];
            }
        }
    }

    let mut mu = DVector::zeros(n);
    mu[0] = 1.0;
    for k in 1..n {
        mu[k] = (0..k).map(|i| mu[i] * a[(i, k)]).sum();
    }

    let total = mu.sum();
    if !(total > 0.0 && total.is_finite()) || mu.iter().any(|&x| !(x > 0.0)) {
        return Err(DecompositionError::Reducible.into());
    }
    Ok(mu / total)
}

/// Standard norm: right vectors from the Schur form, `L = R⁻¹`.
fn standard(matrix: &DMatrix<f64>, config: &Config) -> Result<Decomposition> {
    let pairs = general_eigen(matrix, config.seed)?;
    let mut right = pairs.vectors;
    let mut left = right
        .clone()
        .try_inverse()
        .ok_or(DecompositionError::SingularBasis {
            reason: "right eigenvector basis is not invertible",
        })?;

    normalize_stationary(&mut right, &mut left)?;
    clean_real_modes(&pairs.values, &mut right, &mut left);

    tracing::debug!(n = matrix.nrows(), "dense standard decomposition");
    Ok(Decomposition::new(
        right,
        CVector::from_vec(pairs.values),
        left,
        Norm::Standard,
    ))
}

/// Reversible norm: orthonormal eigenvectors of `D^½ T D^-½`.
fn reversible(matrix: &DMatrix<f64>, stationary: &DVector<f64>) -> Result<Decomposition> {
    let sqrt_mu = sqrt_stationary(stationary)?;
    let pairs = symmetric_eigen(&symmetrize(matrix, &sqrt_mu))?;

    tracing::debug!(n = matrix.nrows(), "dense reversible decomposition");
    Ok(from_symmetric(&pairs.values, &pairs.vectors, &sqrt_mu))
}

/// `D^½ T D^-½`, averaged with its transpose to remove rounding asymmetry.
fn symmetrize(matrix: &DMatrix<f64>, sqrt_stationary: &DVector<f64>) -> DMatrix<f64> {
    let n = matrix.nrows();
    let s = DMatrix::from_fn(n, n, |i, j| {
        sqrt_stationary[i] * matrix[(i, j)] / sqrt_stationary[j]
    });
    (&s + s.transpose()) * 0.5
}
