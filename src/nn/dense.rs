//! Fully connected layer: `y = act(x · W + b)`.
//!
//! `W` is stored as `in_features × out_features`, so batches (rows = samples)
//! multiply on the left without a transpose.

use nalgebra::DMatrix;

use crate::error::{AppError, AppResult};
use crate::nn::{Activation, add_row, matrix_from_rows};

#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    weights: DMatrix<f64>,
    bias: Vec<f64>,
    activation: Activation,
}

impl Dense {
    pub fn new(weights: DMatrix<f64>, bias: Vec<f64>, activation: Activation) -> AppResult<Self> {
        if weights.ncols() != bias.len() {
            return Err(AppError::input(format!(
                "Dense layer has {} output units but {} bias entries.",
                weights.ncols(),
                bias.len()
            )));
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    /// Build from nested kernel rows (one row per input feature).
    pub fn from_rows(rows: &[Vec<f64>], bias: Vec<f64>, activation: Activation) -> AppResult<Self> {
        Self::new(matrix_from_rows(rows, "Dense kernel")?, bias, activation)
    }

    pub fn in_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn forward(&self, x: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        if x.ncols() != self.in_features() {
            return Err(AppError::data(format!(
                "Dense layer expects {} features, got {}.",
                self.in_features(),
                x.ncols()
            )));
        }
        let mut y = x * &self.weights;
        add_row(&mut y, &self.bias);
        if self.activation != Activation::Linear {
            let act = self.activation;
            y.apply(|v| *v = act.apply(*v));
        }
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_applies_kernel_bias_and_activation() {
        // 2 inputs -> 3 units.
        let layer = Dense::from_rows(
            &[vec![1.0, 0.0, -1.0], vec![0.5, 2.0, 0.0]],
            vec![0.0, -1.0, 0.5],
            Activation::Relu,
        )
        .unwrap();
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, -1.0, 0.0]);
        let y = layer.forward(&x).unwrap();
        assert_eq!(y.shape(), (2, 3));
        // row 0: [1 + 1, 4 - 1, -1 + 0.5] -> relu -> [2, 3, 0]
        assert_eq!(y.row(0).iter().copied().collect::<Vec<_>>(), vec![2.0, 3.0, 0.0]);
        // row 1: [-1 - 0.5, 0 - 1, 1 + 0.5] -> relu -> [0, 0, 1.5]
        assert_eq!(y.row(1).iter().copied().collect::<Vec<_>>(), vec![0.0, 0.0, 1.5]);
    }

    #[test]
    fn rejects_bias_mismatch_and_wrong_input_width() {
        assert!(Dense::from_rows(&[vec![1.0, 2.0]], vec![0.0], Activation::Linear).is_err());
        let layer = Dense::from_rows(&[vec![1.0]], vec![0.0], Activation::Linear).unwrap();
        assert!(layer.forward(&DMatrix::zeros(1, 2)).is_err());
    }
}
