//! Krylov eigensolvers for the k leading eigenpairs of a matrix-free operator.
//!
//! Both solvers keep an orthonormal basis V of the search space together
//! with its image `W = A V`, take Ritz pairs from the projected matrix
//! `H = Vᵀ W`, and measure every residual `‖A x - θ x‖` explicitly from W.
//! When the wanted pairs have not converged the search space is shrunk by a
//! thick (Krylov-Schur) restart: the basis is replaced by the span of the
//! leading Ritz vectors, wanted ones plus a buffer of the next ones, and
//! grown again from the residual direction those vectors share. Since W is
//! linear in V the restart needs no extra products.
//!
//! - [`arnoldi`]: general operator; complex Ritz vectors are kept as the
//!   real span of their real and imaginary parts
//! - [`lanczos`]: symmetric operator, projected matrix symmetrized
//!
//! With m = n the search space is the whole space and the Ritz pairs are
//! exact eigenpairs after a single pass.

use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::eigen::{general_eigen, symmetric_eigen, EigenPairs, SymmetricPairs};
use crate::config::Config;
use crate::constants::EIGENVALUE_CLUSTER_TOLERANCE;
use crate::error::DecompositionError;
use crate::types::{CMatrix, Complex64};

/// Relative size of a new Krylov direction below which the subspace is
/// considered invariant.
const BREAKDOWN_TOLERANCE: f64 = 1e-12;

/// Parameters of one Krylov solve.
#[derive(Debug, Clone, Copy)]
pub struct KrylovParams {
    /// Number of wanted eigenpairs.
    pub k: usize,
    /// Krylov subspace dimension m (k <= m <= n).
    pub dim: usize,
    /// Relative residual tolerance.
    pub tolerance: f64,
    /// Restarts before giving up.
    pub max_restarts: usize,
    /// Start vector seed.
    pub seed: u64,
}

impl KrylovParams {
    /// Parameters for `k` modes of an `n`-state operator.
    pub fn new(k: usize, n: usize, config: &Config) -> Self {
        Self {
            k,
            dim: config.resolve_krylov_dim(k, n),
            tolerance: config.krylov_tolerance,
            max_restarts: config.max_restarts,
            seed: config.seed,
        }
    }

    /// Ritz vectors carried over a restart: the wanted ones plus half of the
    /// remaining room, leaving at least two free slots (one may be taken by
    /// the partner of a split conjugate pair).
    fn retained(&self, m: usize) -> usize {
        (self.k + m.saturating_sub(self.k) / 2)
            .min(m.saturating_sub(2))
            .max(self.k)
    }
}

/// k leading eigenpairs of a general real operator.
///
/// Ritz vectors are unit-norm columns; real Ritz values have real vectors.
pub fn arnoldi<F>(n: usize, apply: F, params: &KrylovParams) -> Result<EigenPairs, DecompositionError>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
    let mut space = Subspace::new(n);
    let mut worst = f64::INFINITY;

    for restart in 0..=params.max_restarts {
        space.expand(&apply, params.dim, &mut rng);
        let m = space.len();
        if m < params.k {
            return Err(DecompositionError::SingularBasis {
                reason: "krylov subspace smaller than the requested number of modes",
            });
        }
        let ritz = general_eigen(&space.projected(), params.seed.wrapping_add(restart as u64))?;

        let wanted = ritz.vectors.columns(0, params.k);
        let vectors: CMatrix = &space.basis_matrix().map(|x| Complex64::new(x, 0.0)) * wanted;
        let images: CMatrix = &space.image_matrix().map(|x| Complex64::new(x, 0.0)) * wanted;
        worst = (0..params.k)
            .map(|i| {
                let theta = ritz.values[i];
                let residual = images.column(i).into_owned() - vectors.column(i).into_owned() * theta;
                residual.norm() / theta.norm().max(1.0)
            })
            .fold(0.0_f64, f64::max);

        if worst <= params.tolerance {
            tracing::debug!(restart, residual = worst, dim = m, "arnoldi converged");
            return Ok(EigenPairs {
                values: ritz.values[..params.k].to_vec(),
                vectors,
            });
        }
        if restart == params.max_restarts {
            break;
        }
        space.restart(&real_ritz_basis(&ritz, params.retained(m)));
    }

    tracing::debug!(restarts = params.max_restarts, residual = worst, "arnoldi did not converge");
    Err(DecompositionError::NotConverged {
        iterations: params.max_restarts,
        residual: worst,
    })
}

/// k leading (by modulus) eigenpairs of a symmetric real operator.
///
/// Symmetry is not checked: the projected matrix is symmetrized, so a
/// non-symmetric operator yields meaningless pairs rather than an error.
pub fn lanczos<F>(
    n: usize,
    apply: F,
    params: &KrylovParams,
) -> Result<SymmetricPairs, DecompositionError>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
    let mut space = Subspace::new(n);
    let mut worst = f64::INFINITY;

    for restart in 0..=params.max_restarts {
        space.expand(&apply, params.dim, &mut rng);
        let m = space.len();
        if m < params.k {
            return Err(DecompositionError::SingularBasis {
                reason: "krylov subspace smaller than the requested number of modes",
            });
        }
        let projected = space.projected();
        let ritz = symmetric_eigen(&((&projected + projected.transpose()) * 0.5))?;

        let wanted = ritz.vectors.columns(0, params.k);
        let vectors = space.basis_matrix() * wanted;
        let images = space.image_matrix() * wanted;
        worst = (0..params.k)
            .map(|i| {
                let theta = ritz.values[i];
                let residual = images.column(i).into_owned() - vectors.column(i).into_owned() * theta;
                residual.norm() / theta.abs().max(1.0)
            })
            .fold(0.0_f64, f64::max);

        if worst <= params.tolerance {
            tracing::debug!(restart, residual = worst, dim = m, "lanczos converged");
            return Ok(SymmetricPairs {
                values: ritz.values[..params.k].to_vec(),
                vectors,
            });
        }
        if restart == params.max_restarts {
            break;
        }
        let keep = params.retained(m);
        space.restart(&ritz.vectors.columns(0, keep).into_owned());
    }

    tracing::debug!(restarts = params.max_restarts, residual = worst, "lanczos did not converge");
    Err(DecompositionError::NotConverged {
        iterations: params.max_restarts,
        residual: worst,
    })
}

/// Orthonormal real basis (in projected coordinates) of the span of the
/// first `keep` Ritz vectors.
///
/// A complex Ritz vector contributes its real and imaginary parts, which
/// also cover its conjugate partner; the partner itself is then skipped.
fn real_ritz_basis(ritz: &EigenPairs, keep: usize) -> DMatrix<f64> {
    let mut columns = Vec::with_capacity(keep + 1);
    for i in 0..keep {
        let theta = ritz.values[i];
        let y = ritz.vectors.column(i);
        if theta.im == 0.0 {
            columns.push(y.map(|z| z.re));
            continue;
        }
        let covered = (0..i).any(|j| {
            (ritz.values[j] - theta.conj()).norm()
                <= EIGENVALUE_CLUSTER_TOLERANCE * (1.0 + theta.norm())
        });
        if !covered {
            columns.push(y.map(|z| z.re));
            columns.push(y.map(|z| z.im));
        }
    }
    DMatrix::from_columns(&columns).qr().q()
}

/// Search space: orthonormal basis vectors and their images under A.
struct Subspace {
    n: usize,
    basis: Vec<DVector<f64>>,
    image: Vec<DVector<f64>>,
}

impl Subspace {
    fn new(n: usize) -> Self {
        Self {
            n,
            basis: Vec::new(),
            image: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.basis.len()
    }

    fn basis_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_columns(&self.basis)
    }

    fn image_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_columns(&self.image)
    }

    /// `H = Vᵀ A V`.
    fn projected(&self) -> DMatrix<f64> {
        let m = self.len();
        DMatrix::from_fn(m, m, |i, j| self.basis[i].dot(&self.image[j]))
    }

    /// Remove the components along the basis (modified Gram-Schmidt, twice).
    fn orthogonalize(&self, v: &mut DVector<f64>) {
        for _ in 0..2 {
            for b in &self.basis {
                let coeff = b.dot(v);
                v.axpy(-coeff, b, 1.0);
            }
        }
    }

    /// Grow to `m` vectors (or to n, whichever is smaller).
    ///
    /// The first new direction is the largest component of the current image
    /// outside the basis: after a thick restart every kept Ritz vector has
    /// its residual along that same direction. Each later direction is the
    /// image of the newest vector. A direction that vanishes under
    /// orthogonalization means the basis spans an invariant subspace; a
    /// random direction replaces it.
    fn expand<F>(&mut self, apply: &F, m: usize, rng: &mut Xoshiro256PlusPlus)
    where
        F: Fn(&DVector<f64>) -> DVector<f64>,
    {
        let m = m.min(self.n);
        let mut next = self
            .image
            .iter()
            .map(|w| self.outside(w))
            .max_by(|a, b| a.0.norm().total_cmp(&b.0.norm()));

        while self.len() < m {
            let candidate = next.take().and_then(|(mut v, scale)| {
                (v.norm() > BREAKDOWN_TOLERANCE * scale && renormalize(&mut v)).then_some(v)
            });
            let Some(direction) = candidate.or_else(|| self.random_direction(rng)) else {
                return;
            };

            let image = apply(&direction);
            self.basis.push(direction);
            next = Some(self.outside(&image));
            self.image.push(image);
        }
    }

    /// Component of `w` orthogonal to the basis, with the norm of `w`.
    fn outside(&self, w: &DVector<f64>) -> (DVector<f64>, f64) {
        let mut v = w.clone();
        self.orthogonalize(&mut v);
        (v, w.norm())
    }

    fn random_direction(&self, rng: &mut Xoshiro256PlusPlus) -> Option<DVector<f64>> {
        let mut v = random_unit_vector(self.n, rng);
        self.orthogonalize(&mut v);
        (v.norm() > BREAKDOWN_TOLERANCE && renormalize(&mut v)).then_some(v)
    }

    /// Replace the basis by `V Z` (and the image by `W Z`) for an
    /// orthonormal `Z` in projected coordinates.
    fn restart(&mut self, z: &DMatrix<f64>) {
        let basis = self.basis_matrix() * z;
        let image = self.image_matrix() * z;
        self.basis = basis.column_iter().map(|c| c.into_owned()).collect();
        self.image = image.column_iter().map(|c| c.into_owned()).collect();
    }
}

fn random_unit_vector(n: usize, rng: &mut Xoshiro256PlusPlus) -> DVector<f64> {
    let mut v = DVector::from_fn(n, |_, _| rng.random::<f64>() - 0.5);
    if !renormalize(&mut v) {
        v = DVector::from_element(n, 1.0 / (n as f64).sqrt());
    }
    v
}

/// Normalize in place; false if the vector is (numerically) zero.
fn renormalize(v: &mut DVector<f64>) -> bool {
    let norm = v.norm();
    if !norm.is_finite() || norm <= f64::MIN_POSITIVE {
        return false;
    }
    v.unscale_mut(norm);
    true
}
