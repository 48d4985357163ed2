//! Property-based tests on random small chains.

use markov_fingerprint::{
    correlation, eigenvalues, fingerprint_correlation, fingerprint_relaxation,
    rdl_decomposition, stationary_distribution, timescales, Complex64, Norm,
};
use nalgebra::DMatrix;
use proptest::prelude::*;

use crate::fixtures::{drift_ring, to_csr};

/// Row-normalize a matrix of positive weights.
fn normalize_rows(mut w: DMatrix<f64>) -> DMatrix<f64> {
    for i in 0..w.nrows() {
        let total: f64 = w.row(i).sum();
        for j in 0..w.ncols() {
            w[(i, j)] /= total;
        }
    }
    w
}

/// Reversible chain `T = D⁻¹ W` with symmetric positive weights W, plus two
/// observables.
fn reversible_case() -> impl Strategy<Value = (DMatrix<f64>, Vec<f64>, Vec<f64>)> {
    (3usize..=8).prop_flat_map(|n| {
        (
            prop::collection::vec(0.05f64..1.0, n * n),
            prop::collection::vec(-1.0f64..1.0, n),
            prop::collection::vec(-1.0f64..1.0, n),
        )
            .prop_map(move |(w, a, b)| {
                let sym = DMatrix::from_fn(n, n, |i, j| w[i.min(j) * n + i.max(j)]);
                (normalize_rows(sym), a, b)
            })
    })
}

/// Generic dense chain with positive entries (almost surely non-reversible).
fn general_case() -> impl Strategy<Value = (DMatrix<f64>, Vec<f64>, Vec<f64>)> {
    (3usize..=8).prop_flat_map(|n| {
        (
            prop::collection::vec(0.05f64..1.0, n * n),
            prop::collection::vec(-1.0f64..1.0, n),
            prop::collection::vec(-1.0f64..1.0, n),
        )
            .prop_map(move |(w, a, b)| {
                (normalize_rows(DMatrix::from_row_slice(n, n, &w)), a, b)
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// L R = I, l_1 = μ, r_1 = 1 and l_i = μ ⊙ r_i under the reversible norm.
    #[test]
    fn prop_reversible_identities((t, _, _) in reversible_case()) {
        let n = t.nrows();
        let mu = stationary_distribution(&t).unwrap();
        let d = rdl_decomposition(&t, None, Norm::Auto).unwrap();

        prop_assert_eq!(d.norm(), Norm::Reversible);
        prop_assert!(d.biorthogonality_error() < 1e-9);
        for i in 0..n {
            prop_assert!((d.right()[(i, 0)].re - 1.0).abs() < 1e-9);
            prop_assert!((d.left()[(0, i)].re - mu[i]).abs() < 1e-12);
            for mode in 0..n {
                let expected = mu[i] * d.right()[(i, mode)].re;
                prop_assert!((d.left()[(mode, i)].re - expected).abs() < 1e-9);
            }
        }
    }

    /// The standard basis of a generic chain is biorthogonal and carries μ.
    #[test]
    fn prop_standard_identities((t, _, _) in general_case()) {
        let n = t.nrows();
        let mu = stationary_distribution(&t).unwrap();
        let d = rdl_decomposition(&t, None, Norm::Standard).unwrap();

        prop_assert!(d.biorthogonality_error() < 1e-8);
        prop_assert!((d.eigenvalues()[0].re - 1.0).abs() < 1e-10);
        for i in 0..n {
            prop_assert!((d.stationary_distribution()[i] - mu[i]).abs() < 1e-10);
        }
    }

    /// Direct propagation and the full spectral sum give the same function.
    #[test]
    fn prop_correlation_routes_agree((t, a, b) in reversible_case()) {
        let n = t.nrows();
        let times: Vec<f64> = (0..n).map(|s| s as f64).collect();
        let direct = correlation(&t, &a, Some(&b), &times, None).unwrap();
        let spectral = correlation(&t, &a, Some(&b), &times, Some(n)).unwrap();
        for (x, y) in direct.iter().zip(&spectral) {
            prop_assert!((x - y).abs() < 1e-9, "{} vs {}", x, y);
        }
    }

    /// Same agreement on non-reversible chains (complex spectra).
    #[test]
    fn prop_correlation_routes_agree_general((t, a, b) in general_case()) {
        let n = t.nrows();
        let times: Vec<f64> = (0..n).map(|s| s as f64).collect();
        let direct = correlation(&t, &a, Some(&b), &times, None).unwrap();
        let spectral = correlation(&t, &a, Some(&b), &times, Some(n)).unwrap();
        for (x, y) in direct.iter().zip(&spectral) {
            prop_assert!((x - y).abs() < 1e-8, "{} vs {}", x, y);
        }
    }

    /// Amplitudes sum to the t = 0 value, and truncation keeps a prefix.
    #[test]
    fn prop_fingerprint_sums_and_prefixes((t, a, b) in reversible_case()) {
        let mu = stationary_distribution(&t).unwrap();
        let overlap: f64 = (0..t.nrows()).map(|i| mu[i] * a[i] * b[i]).sum();

        let full = fingerprint_correlation(&t, &a, Some(&b), None, 1.0).unwrap();
        prop_assert!((full.initial_value() - overlap).abs() < 1e-10);

        let head = fingerprint_correlation(&t, &a, Some(&b), Some(2), 1.0).unwrap();
        prop_assert_eq!(head.len(), 2);
        for i in 0..2 {
            prop_assert!((head.amplitudes[i] - full.amplitudes[i]).abs() < 1e-12);
        }
    }

    /// Relaxation amplitudes scale linearly with the initial vector.
    #[test]
    fn prop_relaxation_linear((t, a, b) in reversible_case(), scale in 0.1f64..10.0) {
        let scaled: Vec<f64> = a.iter().map(|x| scale * x).collect();
        let base = fingerprint_relaxation(&t, &a, &b, None, 1.0).unwrap();
        let other = fingerprint_relaxation(&t, &scaled, &b, None, 1.0).unwrap();
        for (x, y) in base.amplitudes.iter().zip(&other.amplitudes) {
            prop_assert!((scale * x - y).abs() < 1e-9 * (1.0 + y.abs()));
        }
    }

    /// The stationary mode of a non-reversible chain never decays.
    #[test]
    fn prop_stationary_timescale_is_infinite((t, _, _) in general_case(), tau in 0.1f64..100.0) {
        let values = eigenvalues(&t, None).unwrap();
        prop_assert_eq!(values[0], Complex64::new(1.0, 0.0));

        let ts = timescales(&t, tau, None).unwrap();
        prop_assert_eq!(ts[0], f64::INFINITY);
        for &x in &ts[1..] {
            prop_assert!(x.is_finite() && x >= 0.0, "{}", x);
        }
    }

    /// Same on sparse drifting rings larger than the Krylov dimension.
    #[test]
    fn prop_sparse_stationary_timescale_is_infinite(
        n in 35usize..=60,
        forward in 0.3f64..0.7,
        backward in 0.0f64..0.2,
        tau in 0.5f64..20.0,
    ) {
        let csr = to_csr(&drift_ring(n, forward, backward));
        let ts = timescales(&csr, tau, Some(3)).unwrap();
        prop_assert_eq!(ts.len(), 3);
        prop_assert_eq!(ts[0], f64::INFINITY);
        prop_assert!(ts[1].is_finite() && ts[1] > 0.0);
    }
}
