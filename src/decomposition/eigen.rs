//! Dense eigenpairs of small and medium matrices.
//!
//! - [`general_eigen`]: eigenvalues from the real Schur form, right
//!   eigenvectors by shifted inverse iteration in complex arithmetic
//! - [`symmetric_eigen`]: thin wrapper over nalgebra's symmetric QR
//! - [`spectral_order`]: the descending-modulus ordering shared by every path
//!
//! Real eigenvalues always come with real eigenvectors (zero imaginary part),
//! and the two members of a complex conjugate pair get conjugate vectors.

use nalgebra::{DMatrix, DVector, Schur, SymmetricEigen};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::constants::{
    EIGENVALUE_CLUSTER_TOLERANCE, INVERSE_ITERATIONS, INVERSE_ITERATION_SHIFT,
    SCHUR_MAX_ITERATIONS, SIGN_PIVOT_TOLERANCE,
};
use crate::error::DecompositionError;
use crate::types::{CMatrix, CVector, Complex64};

/// Eigenvalues and right eigenvectors (as columns), in spectral order.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    /// Eigenvalues, descending modulus.
    pub values: Vec<Complex64>,
    /// Unit-norm right eigenvectors, one column per eigenvalue.
    pub vectors: CMatrix,
}

/// Real symmetric eigenpairs in spectral order.
#[derive(Debug, Clone)]
pub struct SymmetricPairs {
    /// Eigenvalues, descending modulus.
    pub values: Vec<f64>,
    /// Orthonormal eigenvectors, one column per eigenvalue.
    pub vectors: DMatrix<f64>,
}

/// Permutation that sorts eigenvalues by descending modulus.
///
/// Ties are broken by descending real part, then descending imaginary part,
/// so a conjugate pair lists `Im > 0` first. The eigenvalue closest to one is
/// moved to the front: for a stochastic matrix that is the stationary mode,
/// which rounding could otherwise place behind `-1` on a periodic chain.
pub fn spectral_order(values: &[Complex64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        let (x, y) = (values[a], values[b]);
        y.norm()
            .total_cmp(&x.norm())
            .then(y.re.total_cmp(&x.re))
            .then(y.im.total_cmp(&x.im))
    });

    let distance_to_one = |i: usize| (values[i] - Complex64::new(1.0, 0.0)).norm();
    let stationary = (0..order.len())
        .min_by(|&a, &b| distance_to_one(order[a]).total_cmp(&distance_to_one(order[b])));

    if let Some(pos) = stationary {
        let closest = values[order[pos]];
        let leading = values[order[0]];
        // Only promote a genuine unit-modulus competitor.
        if pos > 0 && (closest.norm() - leading.norm()).abs() <= EIGENVALUE_CLUSTER_TOLERANCE {
            let idx = order.remove(pos);
            order.insert(0, idx);
        }
    }
    order
}

/// Eigenvalues of a general real matrix, in spectral order.
pub fn general_eigenvalues(matrix: &DMatrix<f64>) -> Result<Vec<Complex64>, DecompositionError> {
    if matrix.nrows() == 0 {
        return Ok(Vec::new());
    }
    let schur = Schur::try_new(matrix.clone(), f64::EPSILON, SCHUR_MAX_ITERATIONS).ok_or(
        DecompositionError::NotConverged {
            iterations: SCHUR_MAX_ITERATIONS,
            residual: f64::NAN,
        },
    )?;
    let raw: Vec<Complex64> = schur.complex_eigenvalues().iter().copied().collect();
    let order = spectral_order(&raw);
    Ok(order.into_iter().map(|i| raw[i]).collect())
}

/// Eigenvalues and right eigenvectors of a general real matrix.
///
/// Fails with [`DecompositionError::SingularBasis`] if inverse iteration
/// cannot produce a vector (which only happens for non-finite input).
/// Defective matrices yield (nearly) parallel vectors; callers detect that
/// when inverting the basis.
pub fn general_eigen(matrix: &DMatrix<f64>, seed: u64) -> Result<EigenPairs, DecompositionError> {
    let n = matrix.nrows();
    let values = general_eigenvalues(matrix)?;
    let complex = matrix.map(|x| Complex64::new(x, 0.0));
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let mut vectors = CMatrix::zeros(n, values.len());
    for (i, &lambda) in values.iter().enumerate() {
        // Second member of a conjugate pair reuses the first one's vector.
        if lambda.im < 0.0 {
            let partner = (0..i).find(|&j| {
                (values[j] - lambda.conj()).norm()
                    <= EIGENVALUE_CLUSTER_TOLERANCE * (1.0 + lambda.norm())
                    && values[j].im > 0.0
            });
            if let Some(j) = partner {
                let conj = vectors.column(j).map(|z| z.conj());
                vectors.set_column(i, &conj);
                continue;
            }
        }

        let cluster: Vec<CVector> = (0..i)
            .filter(|&j| {
                (values[j] - lambda).norm() <= EIGENVALUE_CLUSTER_TOLERANCE * (1.0 + lambda.norm())
            })
            .map(|j| vectors.column(j).into_owned())
            .collect();

        let v = inverse_iteration(&complex, lambda, &cluster, &mut rng)?;
        vectors.set_column(i, &v);
    }

    Ok(EigenPairs { values, vectors })
}

/// Eigenpairs of a real symmetric matrix, in spectral order.
///
/// Vector signs are fixed so the largest-magnitude component is positive;
/// among components of (nearly) equal magnitude the first one decides.
pub fn symmetric_eigen(matrix: &DMatrix<f64>) -> Result<SymmetricPairs, DecompositionError> {
    let n = matrix.nrows();
    if n == 0 {
        return Ok(SymmetricPairs {
            values: Vec::new(),
            vectors: DMatrix::zeros(0, 0),
        });
    }
    let eigen = SymmetricEigen::try_new(matrix.clone(), f64::EPSILON, SCHUR_MAX_ITERATIONS).ok_or(
        DecompositionError::NotConverged {
            iterations: SCHUR_MAX_ITERATIONS,
            residual: f64::NAN,
        },
    )?;

    let raw: Vec<Complex64> = eigen
        .eigenvalues
        .iter()
        .map(|&x| Complex64::new(x, 0.0))
        .collect();
    let order = spectral_order(&raw);

    let mut vectors = DMatrix::zeros(n, n);
    let mut values = Vec::with_capacity(n);
    for (dst, &src) in order.iter().enumerate() {
        let mut column = eigen.eigenvectors.column(src).into_owned();
        let magnitudes: Vec<f64> = column.iter().map(|x| x.abs()).collect();
        if let Some(pivot) = sign_pivot(&magnitudes) {
            if column[pivot] < 0.0 {
                column.neg_mut();
            }
        }
        vectors.set_column(dst, &column);
        values.push(eigen.eigenvalues[src]);
    }

    Ok(SymmetricPairs { values, vectors })
}

/// Shifted inverse iteration for one eigenvalue.
///
/// The start vector is random; components along `cluster` (already computed
/// vectors of numerically equal eigenvalues) are projected out before every
/// solve so repeated eigenvalues get independent vectors.
fn inverse_iteration(
    matrix: &CMatrix,
    lambda: Complex64,
    cluster: &[CVector],
    rng: &mut Xoshiro256PlusPlus,
) -> Result<CVector, DecompositionError> {
    let n = matrix.nrows();
    // Real shift keeps real eigenvectors real.
    let shift = lambda + Complex64::new(INVERSE_ITERATION_SHIFT * (1.0 + lambda.norm()), 0.0);

    let mut shifted = matrix.clone();
    for i in 0..n {
        shifted[(i, i)] -= shift;
    }
    let lu = shifted.lu();

    let mut x = CVector::from_fn(n, |_, _| Complex64::new(rng.random::<f64>() - 0.5, 0.0));
    for _ in 0..INVERSE_ITERATIONS {
        project_out(&mut x, cluster);
        x = lu.solve(&x).ok_or(DecompositionError::SingularBasis {
            reason: "shifted system is exactly singular",
        })?;
        normalize(&mut x)?;
    }
    project_out(&mut x, cluster);
    normalize(&mut x)?;

    if lambda.im == 0.0 {
        fix_real_phase(&mut x);
    }
    Ok(x)
}

fn project_out(x: &mut CVector, basis: &[CVector]) {
    // Twice is enough (DGKS).
    for _ in 0..2 {
        for v in basis {
            let coeff = v.dotc(x);
            x.axpy(-coeff, v, Complex64::new(1.0, 0.0));
        }
    }
}

fn normalize(x: &mut CVector) -> Result<(), DecompositionError> {
    let norm = x.norm();
    if !norm.is_finite() || norm == 0.0 {
        return Err(DecompositionError::SingularBasis {
            reason: "inverse iteration collapsed",
        });
    }
    x.unscale_mut(norm);
    Ok(())
}

/// Index of the first component whose magnitude is within
/// [`SIGN_PIVOT_TOLERANCE`] (relative) of the largest one.
///
/// `None` for an empty or all-zero vector.
pub(crate) fn sign_pivot(magnitudes: &[f64]) -> Option<usize> {
    let largest = magnitudes.iter().copied().fold(0.0_f64, f64::max);
    if !(largest > 0.0) {
        return None;
    }
    magnitudes
        .iter()
        .position(|&m| m >= largest * (1.0 - SIGN_PIVOT_TOLERANCE))
}

/// Rotate a vector belonging to a real eigenvalue onto the real axis, with its
/// sign pivot (see [`sign_pivot`]) positive.
fn fix_real_phase(x: &mut CVector) {
    let magnitudes: Vec<f64> = x.iter().map(|z| z.norm()).collect();
    let Some(index) = sign_pivot(&magnitudes) else {
        return;
    };
    let pivot = x[index];
    let rotation = pivot.conj() / pivot.norm();
    for z in x.iter_mut() {
        *z = Complex64::new((*z * rotation).re, 0.0);
    }
}

/// Real parts of a complex vector.
pub(crate) fn real_part(v: &CVector) -> DVector<f64> {
    v.map(|z| z.re)
}
