//! Forward-only neural network pieces used by the emulator.
//!
//! Only inference is supported: layers are built from exported parameters and
//! evaluated on row-major batches (`rows = samples`).

use nalgebra::DMatrix;

use crate::error::{AppError, AppResult};

pub mod activation;
pub mod dense;
pub mod inverse_pca;
pub mod loss;
pub mod network;

pub use activation::Activation;
pub use dense::Dense;
pub use inverse_pca::InversePca;
pub use loss::Wmse;
pub use network::{Layer, Network};

/// Build a matrix from nested rows, rejecting ragged or empty input.
pub(crate) fn matrix_from_rows(rows: &[Vec<f64>], what: &str) -> AppResult<DMatrix<f64>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 || n_cols == 0 {
        return Err(AppError::input(format!("{what} is empty.")));
    }
    if let Some(i) = rows.iter().position(|r| r.len() != n_cols) {
        return Err(AppError::input(format!(
            "{what} row {i} has {} entries, expected {n_cols}.",
            rows[i].len()
        )));
    }
    Ok(DMatrix::from_fn(n_rows, n_cols, |i, j| rows[i][j]))
}

/// Add `row` to every row of `y`.
pub(crate) fn add_row(y: &mut DMatrix<f64>, row: &[f64]) {
    for (j, mut col) in y.column_iter_mut().enumerate() {
        let b = row[j];
        for v in col.iter_mut() {
            *v += b;
        }
    }
}
