//! Identities every decomposition must satisfy, dense and sparse.

use markov_fingerprint::{
    eigenvalues, is_reversible, rdl_decomposition, stationary_distribution, CMatrix, Complex64,
    Decomposition, Norm,
};
use nalgebra::DMatrix;

use crate::fixtures::{
    birth_death_stationary, drift_ring, metastable, metastable_rates, power_iteration_stationary,
    to_csr, K, N,
};

fn max_residual(t: &DMatrix<f64>, d: &Decomposition) -> f64 {
    let tc = t.map(|x| Complex64::new(x, 0.0));
    let right = &tc * d.right() - d.right() * d.diagonal();
    let left = d.left() * &tc - d.diagonal() * d.left();
    right
        .iter()
        .chain(left.iter())
        .map(|z| z.norm())
        .fold(0.0, f64::max)
}

/// `r_i l_iᵀ`: invariant under the per-mode scaling freedom.
fn projector(d: &Decomposition, i: usize) -> CMatrix {
    d.right_vector(i) * d.left_vector(i).transpose()
}

// ============================================================================
// Dense
// ============================================================================

#[test]
fn dense_reversible_identities() {
    let t = metastable();
    let (p, q) = metastable_rates();
    let mu = birth_death_stationary(&p, &q);
    let d = rdl_decomposition(&t, None, Norm::Reversible).unwrap();

    assert_eq!(d.n_modes(), N);
    assert_eq!(d.norm(), Norm::Reversible);
    assert!(d.biorthogonality_error() < 1e-12);
    assert!(max_residual(&t, &d) < 1e-12);
    assert!(d.is_real());

    assert!((d.eigenvalues()[0].re - 1.0).abs() < 1e-12);
    for i in 0..N {
        assert!((d.right()[(i, 0)].re - 1.0).abs() < 1e-10, "r_1[{i}]");
        assert!((d.left()[(0, i)].re - mu[i]).abs() < 1e-12, "l_1[{i}]");
    }

    // l_i = μ ⊙ r_i for every mode.
    for mode in 0..N {
        for i in 0..N {
            let expected = mu[i] * d.right()[(i, mode)].re;
            assert!((d.left()[(mode, i)].re - expected).abs() < 1e-10);
        }
    }
}

#[test]
fn dense_standard_identities() {
    let t = metastable();
    let (p, q) = metastable_rates();
    let mu = birth_death_stationary(&p, &q);
    let d = rdl_decomposition(&t, None, Norm::Standard).unwrap();

    assert_eq!(d.norm(), Norm::Standard);
    assert!(d.biorthogonality_error() < 1e-10);
    assert!(max_residual(&t, &d) < 1e-10);
    for i in 0..N {
        assert!((d.right()[(i, 0)].re - 1.0).abs() < 1e-10);
        assert!((d.stationary_distribution()[i] - mu[i]).abs() < 1e-12);
    }
}

#[test]
fn dense_norms_share_projectors() {
    let t = metastable();
    let standard = rdl_decomposition(&t, None, Norm::Standard).unwrap();
    let reversible = rdl_decomposition(&t, None, Norm::Reversible).unwrap();

    for mode in 0..N {
        let gap = projector(&standard, mode) - projector(&reversible, mode);
        assert!(gap.iter().all(|z| z.norm() < 1e-9), "mode {mode}");
    }
}

#[test]
fn auto_norm_follows_detailed_balance() {
    let reversible = rdl_decomposition(&metastable(), None, Norm::Auto).unwrap();
    assert_eq!(reversible.norm(), Norm::Reversible);

    let ring = rdl_decomposition(&drift_ring(6, 0.6, 0.1), None, Norm::Auto).unwrap();
    assert_eq!(ring.norm(), Norm::Standard);

    assert!(is_reversible(&metastable()).unwrap());
    assert!(!is_reversible(&drift_ring(6, 0.6, 0.1)).unwrap());
}

#[test]
fn truncation_is_a_prefix() {
    let t = metastable();
    let full = rdl_decomposition(&t, None, Norm::Auto).unwrap();
    let head = rdl_decomposition(&t, Some(K), Norm::Auto).unwrap();

    assert_eq!(head.n_modes(), K);
    assert_eq!(head.n_states(), N);
    for i in 0..K {
        assert_eq!(head.eigenvalues()[i], full.eigenvalues()[i]);
        assert_eq!(head.right_vector(i), full.right_vector(i));
        assert_eq!(head.left_vector(i), full.left_vector(i));
    }
    assert!(head.biorthogonality_error() < 1e-12);
}

#[test]
fn eigenvalues_descend_in_modulus() {
    let values = eigenvalues(&metastable(), None).unwrap();
    assert_eq!(values.len(), N);
    for pair in values.windows(2) {
        assert!(pair[0].norm() >= pair[1].norm());
    }
    // Slow mode across the bottleneck.
    assert!((values[1].re - 0.987_867_081_543_862_6).abs() < 1e-10);
}

#[test]
fn stationary_agrees_with_independent_references() {
    let t = metastable();
    let (p, q) = metastable_rates();
    let closed_form = birth_death_stationary(&p, &q);
    let power = power_iteration_stationary(&t, 20_000);

    let dense = stationary_distribution(&t).unwrap();
    let sparse = stationary_distribution(&to_csr(&t)).unwrap();
    for i in 0..N {
        assert!((dense[i] - closed_form[i]).abs() < 1e-12);
        assert!((dense[i] - power[i]).abs() < 1e-10);
        assert!((sparse[i] - closed_form[i]).abs() < 1e-10);
    }
    assert!((dense.sum() - 1.0).abs() < 1e-14);
}

// ============================================================================
// Sparse
// ============================================================================

#[test]
fn sparse_matches_dense_leading_modes() {
    let t = metastable();
    let csr = to_csr(&t);

    for norm in [Norm::Standard, Norm::Reversible] {
        let dense = rdl_decomposition(&t, Some(K), norm).unwrap();
        let sparse = rdl_decomposition(&csr, Some(K), norm).unwrap();

        assert_eq!(sparse.n_modes(), K);
        assert_eq!(sparse.norm(), norm);
        assert!(sparse.biorthogonality_error() < 1e-9);
        assert!(max_residual(&t, &sparse) < 1e-9);

        for mode in 0..K {
            let dv = dense.eigenvalues()[mode];
            let sv = sparse.eigenvalues()[mode];
            assert!((dv - sv).norm() < 1e-10, "{norm:?} eigenvalue {mode}");

            let gap = projector(&dense, mode) - projector(&sparse, mode);
            assert!(gap.iter().all(|z| z.norm() < 1e-8), "{norm:?} projector {mode}");
        }

        let mu_dense = dense.stationary_distribution();
        let mu_sparse = sparse.stationary_distribution();
        assert!((mu_dense - mu_sparse).amax() < 1e-10);
    }
}

#[test]
fn sparse_reversible_left_is_weighted_right() {
    let t = metastable();
    let (p, q) = metastable_rates();
    let mu = birth_death_stationary(&p, &q);
    let d = rdl_decomposition(&to_csr(&t), Some(K), Norm::Reversible).unwrap();

    for mode in 0..K {
        for i in 0..N {
            let expected = mu[i] * d.right()[(i, mode)].re;
            assert!((d.left()[(mode, i)].re - expected).abs() < 1e-9);
        }
    }
}

#[test]
fn sparse_eigenvalues_match_dense() {
    let t = metastable();
    let dense = eigenvalues(&t, Some(K)).unwrap();
    let sparse = eigenvalues(&to_csr(&t), Some(K)).unwrap();
    for (d, s) in dense.iter().zip(&sparse) {
        assert!((d - s).norm() < 1e-10);
    }
}
