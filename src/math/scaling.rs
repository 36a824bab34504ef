//! Log/standard scaling around the emulator network.
//!
//! The network is trained on standardised log10 quantities:
//!
//! ```text
//! z = (log10(x) - mean) / std
//! x = 10^(z * std + mean)
//! ```
//!
//! Statistics are per column (one entry per parameter or per output).
//! Matrices follow the crate convention: rows are samples, columns are features.

use nalgebra::DMatrix;

use crate::error::{AppError, AppResult};

/// Per-column mean/std pair used to standardise one side of the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl Scaler {
    pub fn new(mean: Vec<f64>, std: Vec<f64>) -> AppResult<Self> {
        if mean.is_empty() {
            return Err(AppError::input("Scaling statistics must not be empty."));
        }
        if mean.len() != std.len() {
            return Err(AppError::input(format!(
                "Scaling mean has {} entries but std has {}.",
                mean.len(),
                std.len()
            )));
        }
        if let Some(i) = mean.iter().position(|m| !m.is_finite()) {
            return Err(AppError::input(format!("Scaling mean[{i}] is not finite.")));
        }
        if let Some(i) = std.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(AppError::input(format!(
                "Scaling std[{i}] must be finite and non-zero, got {}.",
                std[i]
            )));
        }
        Ok(Self { mean, std })
    }

    /// Stack two scalers side by side (columns of `self` first).
    pub fn concat(&self, other: &Scaler) -> Scaler {
        let mut mean = self.mean.clone();
        mean.extend_from_slice(&other.mean);
        let mut std = self.std.clone();
        std.extend_from_slice(&other.std);
        Scaler { mean, std }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    /// `(x - mean) / std`, column-wise.
    pub fn standardize(&self, x: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        self.check_width(x)?;
        let mut out = x.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            let (m, s) = (self.mean[j], self.std[j]);
            for v in col.iter_mut() {
                *v = (*v - m) / s;
            }
        }
        Ok(out)
    }

    /// `z * std + mean`, column-wise.
    pub fn destandardize(&self, z: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        self.check_width(z)?;
        let mut out = z.clone();
        for (j, mut col) in out.column_iter_mut().enumerate() {
            let (m, s) = (self.mean[j], self.std[j]);
            for v in col.iter_mut() {
                *v = *v * s + m;
            }
        }
        Ok(out)
    }

    fn check_width(&self, x: &DMatrix<f64>) -> AppResult<()> {
        if x.ncols() != self.len() {
            return Err(AppError::data(format!(
                "Matrix has {} columns, scaling statistics cover {}.",
                x.ncols(),
                self.len()
            )));
        }
        Ok(())
    }
}

/// Element-wise `log10`, rejecting values that are not strictly positive and finite.
pub fn log10_positive(x: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
    for (j, col) in x.column_iter().enumerate() {
        for (i, &v) in col.iter().enumerate() {
            if !(v.is_finite() && v > 0.0) {
                return Err(AppError::data(format!(
                    "Input at row {i}, column {j} is {v}; emulator inputs must be strictly positive."
                )));
            }
        }
    }
    Ok(x.map(f64::log10))
}

/// Element-wise `10^x`.
pub fn exp10(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.map(|v| 10f64.powf(v))
}
