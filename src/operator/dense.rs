use nalgebra::{DMatrix, DVector};

use super::TransitionOperator;
use crate::config::Config;
use crate::decomposition::{dense, Decomposition};
use crate::error::Result;
use crate::types::{Complex64, Norm};

impl TransitionOperator for DMatrix<f64> {
    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }

    fn matvec_transpose(&self, x: &DVector<f64>) -> DVector<f64> {
        self.tr_mul(x)
    }

    fn for_each_entry(&self, visit: &mut dyn FnMut(usize, usize, f64)) {
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                visit(i, j, self[(i, j)]);
            }
        }
    }

    fn supports_full_decomposition(&self) -> bool {
        true
    }

    fn stationary_distribution(&self, _config: &Config) -> Result<DVector<f64>> {
        dense::stationary_distribution(self)
    }

    fn decompose(
        &self,
        k: Option<usize>,
        norm: Norm,
        stationary: &DVector<f64>,
        config: &Config,
    ) -> Result<Decomposition> {
        dense::decompose(self, k, norm, stationary, config)
    }

    fn spectrum(
        &self,
        k: Option<usize>,
        norm: Norm,
        stationary: &DVector<f64>,
        _config: &Config,
    ) -> Result<Vec<Complex64>> {
        dense::eigenvalues(self, k, norm, stationary)
    }
}
