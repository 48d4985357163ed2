//! Configuration builders, presets and serialization.

use markov_fingerprint::{timescales, Config, SpectralAnalyzer, DEFAULT_SEED};

use crate::fixtures::{metastable, to_csr, K};

// =============================================================================
// BUILDER VALIDATION
// =============================================================================

#[test]
#[should_panic(expected = "row_sum_tolerance must be positive")]
fn row_sum_tolerance_zero_panics() {
    let _ = Config::new().row_sum_tolerance(0.0);
}

#[test]
#[should_panic(expected = "reversibility_tolerance must be non-negative")]
fn reversibility_tolerance_negative_panics() {
    let _ = Config::new().reversibility_tolerance(-1e-12);
}

#[test]
#[should_panic(expected = "krylov_dim must be positive")]
fn krylov_dim_zero_panics() {
    let _ = Config::new().krylov_dim(0);
}

#[test]
#[should_panic(expected = "krylov_tolerance must be positive")]
fn krylov_tolerance_zero_panics() {
    let _ = Config::new().krylov_tolerance(0.0);
}

#[test]
fn zero_reversibility_tolerance_valid() {
    let config = Config::new().reversibility_tolerance(0.0);
    assert_eq!(config.reversibility_tolerance, 0.0);
    assert!(config.validate().is_ok());
}

// =============================================================================
// PRESETS
// =============================================================================

#[test]
fn presets_validate() {
    for config in [Config::default(), Config::strict(), Config::fast()] {
        assert!(config.validate().is_ok());
    }
    assert_eq!(Config::default().seed, DEFAULT_SEED);
}

#[test]
fn analyzer_presets_carry_config() {
    assert_eq!(SpectralAnalyzer::strict().config(), &Config::strict());
    assert_eq!(SpectralAnalyzer::fast().config(), &Config::fast());
    assert_eq!(SpectralAnalyzer::default().config(), &Config::default());
}

#[test]
fn presets_agree_on_sparse_timescales() {
    let csr = to_csr(&metastable());
    let reference = timescales(&csr, 1.0, Some(K)).unwrap();

    for analyzer in [SpectralAnalyzer::strict(), SpectralAnalyzer::fast()] {
        let ts = analyzer.timescales(&csr, 1.0, Some(K)).unwrap();
        for (a, b) in ts.iter().zip(&reference) {
            if b.is_infinite() {
                assert!(a.is_infinite());
            } else {
                assert!((a - b).abs() <= 1e-6 * b);
            }
        }
    }
}

#[test]
fn seed_does_not_change_results() {
    let csr = to_csr(&metastable());
    let a = SpectralAnalyzer::new().seed(1).eigenvalues(&csr, Some(K)).unwrap();
    let b = SpectralAnalyzer::new().seed(2).eigenvalues(&csr, Some(K)).unwrap();
    for (x, y) in a.iter().zip(&b) {
        assert!((x - y).norm() < 1e-10);
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

#[test]
fn config_json_round_trip() {
    let config = Config::fast().krylov_dim(24).seed(99);
    let json = serde_json::to_string(&config).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
    assert!(json.contains("\"krylov_dim\":24"));
}
