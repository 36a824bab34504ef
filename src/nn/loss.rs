//! Weighted mean squared error.
//!
//! `WMSE = mean(((y_true - y_pred) / w)^2)` with one weight per output column.
//! Weights act as target precisions: a column with a small weight dominates
//! the loss. The emulator only uses this to score predictions against a
//! reference set; nothing here trains a network.

use nalgebra::DMatrix;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Wmse {
    weights: Vec<f64>,
}

impl Wmse {
    pub fn new(weights: Vec<f64>) -> AppResult<Self> {
        if weights.is_empty() {
            return Err(AppError::input("WMSE weights must not be empty."));
        }
        if let Some(i) = weights.iter().position(|w| !w.is_finite() || *w == 0.0) {
            return Err(AppError::input(format!(
                "WMSE weight[{i}] must be finite and non-zero, got {}.",
                weights[i]
            )));
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn loss(&self, y_true: &DMatrix<f64>, y_pred: &DMatrix<f64>) -> AppResult<f64> {
        if y_true.shape() != y_pred.shape() {
            return Err(AppError::data(format!(
                "WMSE shape mismatch: truth is {:?}, prediction is {:?}.",
                y_true.shape(),
                y_pred.shape()
            )));
        }
        if y_true.ncols() != self.weights.len() {
            return Err(AppError::data(format!(
                "WMSE has {} weights but the outputs have {} columns.",
                self.weights.len(),
                y_true.ncols()
            )));
        }
        if y_true.nrows() == 0 {
            return Err(AppError::data("WMSE needs at least one row."));
        }

        let mut total = 0.0;
        for j in 0..y_true.ncols() {
            let w = self.weights[j];
            for i in 0..y_true.nrows() {
                let r = (y_true[(i, j)] - y_pred[(i, j)]) / w;
                total += r * r;
            }
        }
        Ok(total / y_true.len() as f64)
    }
}
