//! Equal-weight resampling of importance-weighted samples.
//!
//! Systematic resampling: one uniform offset, `n` evenly spaced positions
//! against the cumulative weights. Each sample is copied either
//! `floor(n w_i)` or `ceil(n w_i)` times; the result is shuffled.

use nalgebra::DMatrix;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Tolerated deviation of the weight sum from 1 before a warning is logged.
const SUM_TOLERANCE: f64 = 1.490_116_119_384_765_6e-8;

/// Resample rows of `samples` (one per weight) into an equally weighted set
/// of the same size.
pub fn resample_equal<R: Rng + ?Sized>(
    samples: &[Vec<f64>],
    weights: &[f64],
    rng: &mut R,
) -> AppResult<DMatrix<f64>> {
    let idx = resample_indices(weights, rng)?;
    if samples.len() != weights.len() {
        return Err(AppError::data(format!(
            "{} samples but {} weights.",
            samples.len(),
            weights.len()
        )));
    }
    let ndim = samples[0].len();
    if let Some(i) = samples.iter().position(|s| s.len() != ndim) {
        return Err(AppError::data(format!(
            "Sample {i} has {} coordinates, expected {ndim}.",
            samples[i].len()
        )));
    }
    Ok(DMatrix::from_fn(idx.len(), ndim, |i, j| samples[idx[i]][j]))
}

/// Indices selected by systematic resampling, shuffled.
pub fn resample_indices<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> AppResult<Vec<usize>> {
    let n = weights.len();
    if n == 0 {
        return Err(AppError::data("Cannot resample an empty sample set."));
    }
    if let Some(i) = weights.iter().position(|w| !(w.is_finite() && *w >= 0.0)) {
        return Err(AppError::numeric(format!(
            "Weight {i} is {}; weights must be finite and non-negative.",
            weights[i]
        )));
    }
    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return Err(AppError::numeric("Weights sum to zero."));
    }
    if (total - 1.0).abs() > SUM_TOLERANCE {
        warn!(total, "resampling weights do not sum to 1; normalising");
    }

    let mut cumulative = Vec::with_capacity(n);
    let mut acc = 0.0;
    for w in weights {
        acc += w / total;
        cumulative.push(acc);
    }
    cumulative[n - 1] = 1.0;

    let offset: f64 = rng.gen_range(0.0..1.0);
    let mut idx = Vec::with_capacity(n);
    let (mut i, mut j) = (0usize, 0usize);
    while i < n {
        let position = (offset + i as f64) / n as f64;
        if position < cumulative[j] {
            idx.push(j);
            i += 1;
        } else {
            j += 1;
        }
    }
    idx.shuffle(rng);
    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn counts(idx: &[usize], n: usize) -> Vec<usize> {
        let mut c = vec![0; n];
        for &i in idx {
            c[i] += 1;
        }
        c
    }

    #[test]
    fn uniform_weights_keep_every_sample_once() {
        let mut rng = StdRng::seed_from_u64(3);
        let idx = resample_indices(&[0.25; 4], &mut rng).unwrap();
        assert_eq!(counts(&idx, 4), vec![1, 1, 1, 1]);
    }

    #[test]
    fn copies_follow_the_weights() {
        let mut rng = StdRng::seed_from_u64(5);
        let w = [0.5, 0.0, 0.3, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let c = counts(&resample_indices(&w, &mut rng).unwrap(), w.len());
        assert_eq!(c[0], 5);
        assert_eq!(c[1], 0);
        assert_eq!(c[2], 3);
        assert_eq!(c[3], 2);
        assert_eq!(c.iter().sum::<usize>(), w.len());
    }

    #[test]
    fn resampled_rows_are_copies_of_inputs() {
        let mut rng = StdRng::seed_from_u64(9);
        let samples = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let out = resample_equal(&samples, &[0.0, 1.0, 0.0], &mut rng).unwrap();
        assert_eq!(out.shape(), (3, 2));
        for row in out.row_iter() {
            assert_eq!((row[0], row[1]), (2.0, 20.0));
        }
    }

    #[test]
    fn unnormalised_weights_are_accepted() {
        let mut rng = StdRng::seed_from_u64(1);
        let idx = resample_indices(&[2.0, 2.0], &mut rng).unwrap();
        assert_eq!(counts(&idx, 2), vec![1, 1]);
    }

    #[test]
    fn rejects_invalid_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(resample_indices(&[], &mut rng).is_err());
        assert!(resample_indices(&[0.0, 0.0], &mut rng).is_err());
        assert!(resample_indices(&[f64::NAN, 1.0], &mut rng).is_err());
    }
}
