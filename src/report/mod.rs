//! Reporting utilities: posterior summaries and formatted terminal output.
//!
//! Formatting lives in `format` so the sampling code stays free of
//! presentation concerns.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::math::{mean_std, quantile_sorted};

pub mod format;

pub use format::*;

/// Marginal posterior summary for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    pub name: String,
    pub median: f64,
    /// 16th percentile.
    pub lower: f64,
    /// 84th percentile.
    pub upper: f64,
    pub mean: f64,
    pub std: f64,
}

/// Per-column summaries of an equally weighted posterior.
pub fn summarize(posterior: &DMatrix<f64>, names: &[String]) -> AppResult<Vec<ParameterSummary>> {
    if names.len() != posterior.ncols() {
        return Err(AppError::data(format!(
            "{} parameter names for {} posterior columns.",
            names.len(),
            posterior.ncols()
        )));
    }
    if posterior.nrows() == 0 {
        return Err(AppError::numeric("Posterior has no samples."));
    }

    let summaries = names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let mut values: Vec<f64> = posterior.column(j).iter().copied().collect();
            values.sort_by(f64::total_cmp);
            let (mean, std) = mean_std(&values);
            ParameterSummary {
                name: name.clone(),
                median: quantile_sorted(&values, 0.5),
                lower: quantile_sorted(&values, 0.16),
                upper: quantile_sorted(&values, 0.84),
                mean,
                std,
            }
        })
        .collect();
    Ok(summaries)
}

/// Names for `n` parameters: the given ones, padded with `theta<i>`.
pub fn parameter_names(given: &[String], n: usize) -> Vec<String> {
    (0..n)
        .map(|i| given.get(i).cloned().unwrap_or_else(|| format!("theta{i}")))
        .collect()
}
