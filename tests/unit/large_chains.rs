//! Chains with more states than the Krylov search space, and chains whose
//! stationary distribution spans many orders of magnitude.

use markov_fingerprint::{
    eigenvalues, fingerprint_correlation, rdl_decomposition, stationary_distribution, timescales,
    Config, Norm,
};
use nalgebra::DMatrix;

use crate::fixtures::{
    assert_allclose, birth_death, birth_death_stationary, drift_ring, indicator, init_tracing,
    to_csr, K,
};

/// Birth-death chain with the same up/down probabilities in every state.
fn uniform_rates(n: usize, up: f64, down: f64) -> (Vec<f64>, Vec<f64>) {
    let mut p = vec![up; n];
    let mut q = vec![down; n];
    p[n - 1] = 0.0;
    q[0] = 0.0;
    (p, q)
}

/// Unbiased walk split into two wells by a 0.01 bottleneck in the middle.
fn double_well(n: usize) -> DMatrix<f64> {
    let (mut p, q) = uniform_rates(n, 0.5, 0.5);
    p[n / 2 - 1] = 0.01;
    birth_death(&p, &q)
}

#[test]
fn chains_exceed_the_krylov_dimension() {
    let config = Config::default();
    for n in [40, 60, 100, 200] {
        assert!(config.resolve_krylov_dim(K, n) < n, "n = {n}");
    }
}

#[test]
fn sparse_fingerprint_matches_dense_on_geometric_chain() {
    init_tracing();
    let n = 60;
    let (p, q) = uniform_rates(n, 0.2, 0.3);
    let t = birth_death(&p, &q);
    let csr = to_csr(&t);
    let obs = indicator(n, &(0..n / 2).collect::<Vec<_>>());

    let dense = fingerprint_correlation(&t, &obs, None, Some(K), 1.0).unwrap();
    let sparse = fingerprint_correlation(&csr, &obs, None, Some(K), 1.0).unwrap();

    assert_eq!(sparse.timescales[0], f64::INFINITY);
    assert_allclose(&sparse.timescales, &dense.timescales, 1e-8, 0.0);
    assert_allclose(&sparse.amplitudes, &dense.amplitudes, 1e-6, 1e-7);
}

#[test]
fn sparse_standard_norm_matches_dense_on_geometric_chain() {
    let n = 60;
    let (p, q) = uniform_rates(n, 0.2, 0.3);
    let t = birth_death(&p, &q);
    let mu = birth_death_stationary(&p, &q);

    let dense = rdl_decomposition(&t, Some(K), Norm::Standard).unwrap();
    let sparse = rdl_decomposition(&to_csr(&t), Some(K), Norm::Standard).unwrap();
    for d in [&dense, &sparse] {
        assert_eq!(d.norm(), Norm::Standard);
        assert!(d.biorthogonality_error() < 1e-8);
        assert_allclose(d.stationary_distribution().as_slice(), mu.as_slice(), 1e-8, 0.0);
    }
    for i in 0..K {
        let gap = sparse.eigenvalues()[i] - dense.eigenvalues()[i];
        assert!(gap.norm() < 1e-10, "mode {i}");
    }
}

#[test]
fn sparse_timescales_match_dense_across_a_bottleneck() {
    // The unbiased walk has eigenvalues near -1 as well as near 1; timescales
    // only see the modulus, so pairs of opposite sign compare equal.
    for n in [40, 100, 200] {
        let t = double_well(n);
        let dense = timescales(&t, 1.0, Some(K)).unwrap();
        let sparse = timescales(&to_csr(&t), 1.0, Some(K)).unwrap();
        assert_eq!(dense[0], f64::INFINITY, "n = {n}");
        assert_eq!(sparse[0], f64::INFINITY, "n = {n}");
        assert_allclose(&sparse, &dense, 1e-8, 0.0);
        // The bottleneck mode is much slower than the walks inside the wells.
        assert!(dense[1] > 2.0 * dense[2], "n = {n}");
    }
}

#[test]
fn sparse_ring_matches_dense() {
    // λ_k = 0.3 + 0.6 ω^k + 0.1 ω^-k: 1 and one conjugate pair lead, the
    // next pair is well separated.
    let n = 40;
    let t = drift_ring(n, 0.6, 0.1);
    let csr = to_csr(&t);

    let dense = eigenvalues(&t, Some(3)).unwrap();
    let sparse = eigenvalues(&csr, Some(3)).unwrap();
    for (a, b) in sparse.iter().zip(&dense) {
        assert!((a - b).norm() < 1e-10, "{a} vs {b}");
    }

    let d = rdl_decomposition(&csr, Some(3), Norm::Auto).unwrap();
    assert_eq!(d.norm(), Norm::Standard);
    assert!(d.biorthogonality_error() < 1e-8);
    let mu = d.stationary_distribution();
    assert!(mu.iter().all(|&x| (x - 1.0 / n as f64).abs() < 1e-9));

    let ts = timescales(&csr, 2.0, Some(3)).unwrap();
    assert_eq!(ts[0], f64::INFINITY);
    assert!((ts[1] - ts[2]).abs() < 1e-8 * ts[1]);
}

#[test]
fn tiny_stationary_probabilities_stay_positive() {
    // μ_i ∝ (2/3)^i: the last states carry ~1e-18 of the mass.
    let n = 100;
    let (p, q) = uniform_rates(n, 0.2, 0.3);
    let t = birth_death(&p, &q);
    let csr = to_csr(&t);
    let exact = birth_death_stationary(&p, &q);
    assert!(exact[n - 1] < 1e-16);

    let dense_mu = stationary_distribution(&t).unwrap();
    let sparse_mu = stationary_distribution(&csr).unwrap();
    assert_allclose(dense_mu.as_slice(), exact.as_slice(), 1e-10, 0.0);
    assert_allclose(sparse_mu.as_slice(), exact.as_slice(), 1e-10, 0.0);
}

#[test]
fn decompositions_survive_tiny_stationary_probabilities() {
    let n = 100;
    let (p, q) = uniform_rates(n, 0.2, 0.3);
    let t = birth_death(&p, &q);
    let exact = birth_death_stationary(&p, &q);
    let obs = indicator(n, &(0..n / 2).collect::<Vec<_>>());

    for norm in [Norm::Standard, Norm::Reversible] {
        let d = rdl_decomposition(&t, None, norm).unwrap();
        assert_eq!(d.norm(), norm);
        assert!(d.biorthogonality_error() < 1e-8, "{norm:?}");
        assert_eq!(d.eigenvalues()[0].re, 1.0);
        assert_allclose(d.stationary_distribution().as_slice(), exact.as_slice(), 1e-8, 0.0);
    }

    let dense = fingerprint_correlation(&t, &obs, None, Some(K), 1.0).unwrap();
    let sparse = fingerprint_correlation(&to_csr(&t), &obs, None, Some(K), 1.0).unwrap();
    assert_eq!(dense.timescales[0], f64::INFINITY);
    assert_allclose(&sparse.timescales, &dense.timescales, 1e-8, 0.0);
    assert_allclose(&sparse.amplitudes, &dense.amplitudes, 1e-6, 1e-7);
}
