use nalgebra::DVector;
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;

use super::TransitionOperator;
use crate::config::Config;
use crate::decomposition::{sparse, Decomposition};
use crate::error::{DecompositionError, Result};
use crate::types::{Complex64, Norm};

impl TransitionOperator for CsrMatrix<f64> {
    fn shape(&self) -> (usize, usize) {
        (self.nrows(), self.ncols())
    }

    fn matvec(&self, x: &DVector<f64>) -> DVector<f64> {
        self * x
    }

    fn matvec_transpose(&self, x: &DVector<f64>) -> DVector<f64> {
        // Scatter through the CSR rows; the transpose is never stored.
        let mut y = DVector::zeros(self.ncols());
        spmm_csr_dense(0.0, &mut y, 1.0, Op::Transpose(self), Op::NoOp(x));
        y
    }

    fn for_each_entry(&self, visit: &mut dyn FnMut(usize, usize, f64)) {
        for (i, j, &v) in self.triplet_iter() {
            visit(i, j, v);
        }
    }

    fn supports_full_decomposition(&self) -> bool {
        false
    }

    fn stationary_distribution(&self, config: &Config) -> Result<DVector<f64>> {
        sparse::stationary_distribution(self, config)
    }

    fn decompose(
        &self,
        k: Option<usize>,
        norm: Norm,
        stationary: &DVector<f64>,
        config: &Config,
    ) -> Result<Decomposition> {
        sparse::decompose(self, k, norm, stationary, config)
    }

    fn spectrum(
        &self,
        k: Option<usize>,
        norm: Norm,
        stationary: &DVector<f64>,
        config: &Config,
    ) -> Result<Vec<Complex64>> {
        let k = k.ok_or(DecompositionError::TruncationRequired)?;
        sparse::eigenvalues(self, k, norm, stationary, config)
    }
}
