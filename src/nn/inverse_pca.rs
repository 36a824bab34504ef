//! Inverse PCA output layer.
//!
//! The astero head predicts principal-component coefficients; this layer maps
//! them back to the full output space with a fixed linear reconstruction:
//!
//! ```text
//! y = x · C + mean
//! ```
//!
//! `C` holds the components as rows (`n_components × n_outputs`), exactly as
//! stored under `custom_objects.inverse_pca.pca_comps` in the emulator metadata.

use nalgebra::DMatrix;

use crate::error::{AppError, AppResult};
use crate::nn::{add_row, matrix_from_rows};

#[derive(Debug, Clone, PartialEq)]
pub struct InversePca {
    components: DMatrix<f64>,
    mean: Vec<f64>,
}

impl InversePca {
    pub fn new(components: &[Vec<f64>], mean: Vec<f64>) -> AppResult<Self> {
        let components = matrix_from_rows(components, "PCA components")?;
        if components.ncols() != mean.len() {
            return Err(AppError::input(format!(
                "PCA components span {} outputs but the PCA mean has {}.",
                components.ncols(),
                mean.len()
            )));
        }
        Ok(Self { components, mean })
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_outputs(&self) -> usize {
        self.components.ncols()
    }

    pub fn forward(&self, x: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        if x.ncols() != self.n_components() {
            return Err(AppError::data(format!(
                "Inverse PCA expects {} components, got {}.",
                self.n_components(),
                x.ncols()
            )));
        }
        let mut y = x * &self.components;
        add_row(&mut y, &self.mean);
        Ok(y)
    }
}
