//! The seam between the inversion and whatever produces model predictions.

use nalgebra::DMatrix;

use crate::error::AppResult;

/// A forward model: parameter vectors in, observables out (rows = samples).
///
/// Implementations are called from the sampler's worker threads and must be
/// reentrant.
pub trait Forward: Sync {
    fn predict(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>>;

    /// Output width, when known ahead of a call (used for early validation).
    fn output_width(&self) -> Option<usize> {
        None
    }
}

impl<T: Forward + ?Sized> Forward for &T {
    fn predict(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        (**self).predict(inputs)
    }

    fn output_width(&self) -> Option<usize> {
        (**self).output_width()
    }
}
