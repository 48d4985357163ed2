//! Leading modes of a transition operator known only through products.
//!
//! Nothing here looks at matrix entries: every routine takes a
//! [`TransitionOperator`] and calls `matvec` / `matvec_transpose`, so the same
//! code serves CSR matrices and matrix-free operators.

use std::collections::{HashMap, VecDeque};

use nalgebra::DVector;

use super::eigen::real_part;
use super::krylov::{arnoldi, lanczos, KrylovParams};
use super::{
    check_biorthogonality, check_residuals, clean_real_modes, from_symmetric,
    in_detailed_balance, normalize_stationary, pin_stationary, sqrt_stationary, standardize,
    Decomposition,
};
use crate::config::Config;
use crate::constants::STATIONARY_EIGENVALUE_TOLERANCE;
use crate::error::{DecompositionError, Result};
use crate::operator::{detailed_balance_violation, TransitionOperator};
use crate::types::{CVector, Complex64, Norm};

/// The `k` leading modes of `operator`.
///
/// A truncation is mandatory: the full spectrum of a sparse matrix is never
/// computed here.
pub fn decompose<T>(
    operator: &T,
    k: Option<usize>,
    norm: Norm,
    stationary: &DVector<f64>,
    config: &Config,
) -> Result<Decomposition>
where
    T: TransitionOperator + ?Sized,
{
    let k = k.ok_or(DecompositionError::TruncationRequired)?;
    let n = operator.n_states();
    let params = KrylovParams::new(k, n, config);
    tracing::debug!(n, k, dim = params.dim, norm = norm.description(), "sparse decomposition");

    let symmetric = |sqrt_mu: &DVector<f64>| -> Result<Decomposition> {
        let pairs = lanczos(n, |x| symmetrized_apply(operator, sqrt_mu, x), &params)?;
        Ok(from_symmetric(&pairs.values, &pairs.vectors, sqrt_mu))
    };

    let decomposition = match norm {
        Norm::Reversible => symmetric(&sqrt_stationary(stationary)?)?,
        Norm::Standard | Norm::Auto if in_detailed_balance(operator, stationary, config) => {
            tracing::debug!(n, "sparse standard decomposition via detailed balance");
            standardize(symmetric(&sqrt_stationary(stationary)?)?)
        }
        Norm::Standard | Norm::Auto => {
            let right = arnoldi(n, |x| operator.matvec(x), &params)?;
            let left = arnoldi(n, |x| operator.matvec_transpose(x), &params)?;

            // Rows of the left Ritz basis pair up with the right one only up
            // to scaling and ordering within clusters; (L R)⁻¹ L fixes both.
            let left_rows = left.vectors.transpose();
            let overlap = &left_rows * &right.vectors;
            let inverse = overlap
                .try_inverse()
                .ok_or(DecompositionError::SingularBasis {
                    reason: "left and right Krylov bases do not pair up",
                })?;

            let mut right_basis = right.vectors;
            let mut left_basis = inverse * left_rows;
            normalize_stationary(&mut right_basis, &mut left_basis)?;
            clean_real_modes(&right.values, &mut right_basis, &mut left_basis);

            Decomposition::new(
                right_basis,
                CVector::from_vec(right.values),
                left_basis,
                Norm::Standard,
            )
        }
    };

    check_biorthogonality(&decomposition)?;
    if decomposition.norm() == Norm::Standard {
        check_residuals(operator, &decomposition, stationary)?;
    }
    Ok(decomposition)
}

/// The `k` leading eigenvalues of `operator`.
pub fn eigenvalues<T>(
    operator: &T,
    k: usize,
    norm: Norm,
    stationary: &DVector<f64>,
    config: &Config,
) -> Result<Vec<Complex64>>
where
    T: TransitionOperator + ?Sized,
{
    let n = operator.n_states();
    let params = KrylovParams::new(k, n, config);
    let mut values: Vec<Complex64> = match norm {
        Norm::Reversible => {
            let sqrt_mu = sqrt_stationary(stationary)?;
            lanczos(n, |x| symmetrized_apply(operator, &sqrt_mu, x), &params)?
                .values
                .into_iter()
                .map(|x| Complex64::new(x, 0.0))
                .collect()
        }
        Norm::Standard | Norm::Auto => arnoldi(n, |x| operator.matvec(x), &params)?.values,
    };
    pin_stationary(&mut values);
    Ok(values)
}

/// Stationary distribution of a sparse chain.
///
/// A chain in detailed balance gets μ exactly, from the ratios
/// `T_ij / T_ji` along a spanning tree, so tiny probabilities keep full
/// relative accuracy. Otherwise μ is the dominant eigenvector of the lazy
/// transposed operator `(Tᵀ + I) / 2`; the lazy operator moves every
/// non-stationary eigenvalue strictly inside the unit disk, so periodic
/// chains converge too. That eigenvector is only accurate relative to its
/// largest entry, and entries below rounding come out as zero.
pub fn stationary_distribution<T>(operator: &T, config: &Config) -> Result<DVector<f64>>
where
    T: TransitionOperator + ?Sized,
{
    let n = operator.n_states();
    if n == 1 {
        return Ok(DVector::from_element(1, 1.0));
    }
    if let Some(mu) = detailed_balance_stationary(operator, config) {
        tracing::debug!(n, "stationary distribution from detailed balance");
        return Ok(mu);
    }

    let params = KrylovParams::new(1, n, config);
    let pairs = arnoldi(n, |x| (operator.matvec_transpose(x) + x) * 0.5, &params)?;

    let theta = pairs.values[0];
    if (theta - Complex64::new(1.0, 0.0)).norm() > STATIONARY_EIGENVALUE_TOLERANCE {
        tracing::warn!(re = theta.re, im = theta.im, "leading Ritz value is not one");
        return Err(DecompositionError::Reducible.into());
    }

    let vector = real_part(&pairs.vectors.column(0).into_owned());
    let total = vector.sum();
    if !(total.abs() > 0.0) {
        return Err(DecompositionError::Reducible.into());
    }
    let clipped = (vector / total).map(|x| x.max(0.0));
    let total = clipped.sum();
    Ok(clipped / total)
}

/// μ from detailed balance, `μ_j = μ_i T_ij / T_ji`, along a breadth-first
/// spanning tree from state 0, accumulated in log space.
///
/// `None` if some edge has no reverse edge, the tree does not reach every
/// state, or the result violates detailed balance on any edge by more than
/// `reversibility_tolerance`.
fn detailed_balance_stationary<T>(operator: &T, config: &Config) -> Option<DVector<f64>>
where
    T: TransitionOperator + ?Sized,
{
    let n = operator.n_states();
    let mut rates: HashMap<(usize, usize), f64> = HashMap::new();
    let mut neighbours = vec![Vec::new(); n];
    operator.for_each_entry(&mut |i, j, value| {
        if i != j && value > 0.0 {
            let rate = rates.entry((i, j)).or_insert(0.0);
            if *rate == 0.0 {
                neighbours[i].push(j);
            }
            *rate += value;
        }
    });

    let mut log_mu = vec![f64::NAN; n];
    log_mu[0] = 0.0;
    let mut queue = VecDeque::from([0usize]);
    while let Some(i) = queue.pop_front() {
        for &j in &neighbours[i] {
            if !log_mu[j].is_nan() {
                continue;
            }
            let forward = rates.get(&(i, j)).copied()?;
            let back = rates.get(&(j, i)).copied()?;
            log_mu[j] = log_mu[i] + forward.ln() - back.ln();
            queue.push_back(j);
        }
    }
    if log_mu.iter().any(|x| x.is_nan()) {
        return None;
    }

    let peak = log_mu.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let unnormalized = DVector::from_iterator(n, log_mu.iter().map(|&x| (x - peak).exp()));
    let mu = &unnormalized / unnormalized.sum();

    (detailed_balance_violation(operator, &mu) <= config.reversibility_tolerance).then_some(mu)
}

/// `D^½ T D^-½ x` without forming the symmetrized matrix.
fn symmetrized_apply<T>(operator: &T, sqrt_stationary: &DVector<f64>, x: &DVector<f64>) -> DVector<f64>
where
    T: TransitionOperator + ?Sized,
{
    let scaled = x.component_div(sqrt_stationary);
    let y = operator.matvec(&scaled);
    let forward = y.component_mul(sqrt_stationary);

    // Average with the transposed product to keep the operator symmetric
    // under rounding.
    let scaled_t = x.component_mul(sqrt_stationary);
    let back = operator.matvec_transpose(&scaled_t).component_div(sqrt_stationary);
    (forward + back) * 0.5
}
