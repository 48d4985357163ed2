//! Transition matrices as linear operators.
//!
//! [`TransitionOperator`] is the seam between the analysis layer and the
//! matrix representation. Dense matrices ([`DMatrix<f64>`]) get the full
//! spectrum; CSR matrices ([`nalgebra_sparse::CsrMatrix<f64>`]) only expose
//! products, so their decompositions are always truncated.

mod dense;
mod sparse;

use std::collections::{HashMap, VecDeque};

use nalgebra::DVector;

use crate::config::Config;
use crate::decomposition::Decomposition;
use crate::error::{FingerprintError, Result, ShapeError};
use crate::types::{Complex64, Norm};

/// A row-stochastic transition matrix.
pub trait TransitionOperator {
    /// `(rows, cols)`.
    fn shape(&self) -> (usize, usize);

    /// Number of states.
    fn n_states(&self) -> usize {
        self.shape().0
    }

    /// `T x`.
    fn matvec(&self, x: &DVector<f64>) -> DVector<f64>;

    /// `Tᵀ x`, i.e. `xᵀ T` as a column.
    fn matvec_transpose(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Visit every stored entry `(row, col, value)`.
    ///
    /// Dense matrices visit all n² entries, zeros included.
    fn for_each_entry(&self, visit: &mut dyn FnMut(usize, usize, f64));

    /// True if the full spectrum is available (dense storage).
    fn supports_full_decomposition(&self) -> bool;

    /// Stationary distribution μ.
    fn stationary_distribution(&self, config: &Config) -> Result<DVector<f64>>;

    /// RDL decomposition under an already resolved `norm`.
    fn decompose(
        &self,
        k: Option<usize>,
        norm: Norm,
        stationary: &DVector<f64>,
        config: &Config,
    ) -> Result<Decomposition>;

    /// Eigenvalues in spectral order under an already resolved `norm`.
    fn spectrum(
        &self,
        k: Option<usize>,
        norm: Norm,
        stationary: &DVector<f64>,
        config: &Config,
    ) -> Result<Vec<Complex64>>;
}

/// Number of states, or a shape error for non-square input.
pub fn check_square<T: TransitionOperator + ?Sized>(operator: &T) -> Result<usize> {
    let (rows, cols) = operator.shape();
    if rows != cols {
        return Err(ShapeError::NotSquare { rows, cols }.into());
    }
    if rows == 0 {
        return Err(FingerprintError::InvalidTransitionMatrix {
            row: 0,
            reason: "matrix has no states".to_string(),
        });
    }
    Ok(rows)
}

/// Check that every entry is finite and non-negative and every row sums to
/// one within `tolerance`.
pub fn check_stochastic<T: TransitionOperator + ?Sized>(operator: &T, tolerance: f64) -> Result<()> {
    let n = operator.n_states();
    let mut row_sums = vec![0.0; n];
    let mut first_bad: Option<(usize, String)> = None;

    operator.for_each_entry(&mut |i, j, value| {
        if first_bad.is_none() && !(value >= 0.0 && value.is_finite()) {
            first_bad = Some((i, format!("entry ({i}, {j}) = {value} is not a probability")));
        }
        row_sums[i] += value;
    });

    if let Some((row, reason)) = first_bad {
        return Err(FingerprintError::InvalidTransitionMatrix { row, reason });
    }
    if let Some((row, sum)) = row_sums
        .iter()
        .enumerate()
        .find(|(_, sum)| (**sum - 1.0).abs() > tolerance)
    {
        return Err(FingerprintError::InvalidTransitionMatrix {
            row,
            reason: format!("row sums to {sum}"),
        });
    }
    Ok(())
}

/// True if every state reaches every other state through positive entries.
pub fn is_irreducible<T: TransitionOperator + ?Sized>(operator: &T) -> bool {
    let n = operator.n_states();
    let mut forward = vec![Vec::new(); n];
    let mut backward = vec![Vec::new(); n];
    operator.for_each_entry(&mut |i, j, value| {
        if value > 0.0 && i != j {
            forward[i].push(j);
            backward[j].push(i);
        }
    });
    reaches_all(&forward) && reaches_all(&backward)
}

/// Breadth-first search from state 0.
fn reaches_all(adjacency: &[Vec<usize>]) -> bool {
    let n = adjacency.len();
    let mut seen = vec![false; n];
    let mut queue = VecDeque::from([0usize]);
    seen[0] = true;
    let mut count = 1;
    while let Some(i) = queue.pop_front() {
        for &j in &adjacency[i] {
            if !seen[j] {
                seen[j] = true;
                count += 1;
                queue.push_back(j);
            }
        }
    }
    count == n
}

/// Largest detailed-balance violation `|μ_i T_ij - μ_j T_ji|`.
pub fn detailed_balance_violation<T: TransitionOperator + ?Sized>(
    operator: &T,
    stationary: &DVector<f64>,
) -> f64 {
    let mut flux: HashMap<(usize, usize), f64> = HashMap::new();
    operator.for_each_entry(&mut |i, j, value| {
        if i != j && value != 0.0 {
            *flux.entry((i, j)).or_insert(0.0) += stationary[i] * value;
        }
    });
    flux.iter()
        .map(|(&(i, j), &forward)| {
            let back = flux.get(&(j, i)).copied().unwrap_or(0.0);
            (forward - back).abs()
        })
        .fold(0.0_f64, f64::max)
}

/// Replace [`Norm::Auto`] with the concrete normalization for this chain.
///
/// The reversible norm needs `sqrt(μ)` strictly positive; a μ with a zero or
/// negative entry always resolves to [`Norm::Standard`].
pub fn resolve_norm<T: TransitionOperator + ?Sized>(
    operator: &T,
    norm: Norm,
    stationary: &DVector<f64>,
    config: &Config,
) -> Norm {
    match norm {
        Norm::Auto if stationary.iter().any(|&x| !(x > 0.0)) => {
            tracing::warn!("stationary distribution has non-positive entries, using the standard norm");
            Norm::Standard
        }
        Norm::Auto => {
            let violation = detailed_balance_violation(operator, stationary);
            let resolved = if violation <= config.reversibility_tolerance {
                Norm::Reversible
            } else {
                Norm::Standard
            };
            tracing::debug!(violation, norm = resolved.description(), "resolved normalization");
            resolved
        }
        other => other,
    }
}

/// Length check for a vector argument.
pub fn check_length(argument: &'static str, found: usize, expected: usize) -> Result<()> {
    if found != expected {
        return Err(ShapeError::LengthMismatch {
            argument,
            expected,
            found,
        }
        .into());
    }
    Ok(())
}
