//! Observations and the Gaussian log-likelihood.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::math::normal_logpdf;

/// Default multiplier on the summed Gaussian log-density.
///
/// Values below 1 flatten the likelihood surface the sampler explores.
pub const DEFAULT_LOGL_SCALE: f64 = 0.001;

/// One observed quantity, aligned by position with an emulator output column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: f64,
    pub uncertainty: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    entries: Vec<Observation>,
}

impl Observations {
    pub fn new(values: &[f64], uncertainties: &[f64]) -> AppResult<Self> {
        if values.len() != uncertainties.len() {
            return Err(AppError::input(format!(
                "{} observed values but {} uncertainties.",
                values.len(),
                uncertainties.len()
            )));
        }
        Self::from_entries(
            values
                .iter()
                .zip(uncertainties)
                .map(|(&value, &uncertainty)| Observation {
                    name: None,
                    value,
                    uncertainty,
                })
                .collect(),
        )
    }

    pub fn from_entries(entries: Vec<Observation>) -> AppResult<Self> {
        if entries.is_empty() {
            return Err(AppError::input("At least one observation is required."));
        }
        for (i, o) in entries.iter().enumerate() {
            if !o.value.is_finite() {
                return Err(AppError::input(format!("Observation {i} has a non-finite value.")));
            }
            if !(o.uncertainty.is_finite() && o.uncertainty > 0.0) {
                return Err(AppError::input(format!(
                    "Observation {i} uncertainty must be finite and > 0, got {}.",
                    o.uncertainty
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Observation] {
        &self.entries
    }

    /// Display label for observation `i` (its name, or `obs<i>`).
    pub fn label(&self, i: usize) -> String {
        self.entries
            .get(i)
            .and_then(|o| o.name.clone())
            .unwrap_or_else(|| format!("obs{i}"))
    }

    /// Unscaled `Σ log N(predicted_i; value_i, uncertainty_i)`.
    pub fn log_density(&self, predicted: &[f64]) -> AppResult<f64> {
        if predicted.len() != self.entries.len() {
            return Err(AppError::data(format!(
                "Model produced {} outputs but {} observations were given.",
                predicted.len(),
                self.entries.len()
            )));
        }
        let total: f64 = predicted
            .iter()
            .zip(&self.entries)
            .map(|(&m, o)| normal_logpdf(m, o.value, o.uncertainty))
            .sum();
        if !total.is_finite() {
            return Err(AppError::numeric(format!(
                "Non-finite log-likelihood for prediction {predicted:?}."
            )));
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peaks_at_the_observed_values() {
        let obs = Observations::new(&[1.0, 5.0], &[0.1, 2.0]).unwrap();
        let best = obs.log_density(&[1.0, 5.0]).unwrap();
        for shifted in [[1.05, 5.0], [1.0, 4.0], [0.9, 6.0]] {
            assert!(obs.log_density(&shifted).unwrap() < best);
        }
    }

    #[test]
    fn width_mismatch_is_a_data_error() {
        let obs = Observations::new(&[1.0], &[0.1]).unwrap();
        let err = obs.log_density(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }

    #[test]
    fn non_finite_prediction_is_a_numeric_error() {
        let obs = Observations::new(&[1.0], &[0.1]).unwrap();
        let err = obs.log_density(&[f64::NAN]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NUMERIC);
    }

    #[test]
    fn rejects_bad_uncertainties() {
        assert!(Observations::new(&[1.0], &[0.0]).is_err());
        assert!(Observations::new(&[1.0, 2.0], &[0.1]).is_err());
        assert!(Observations::new(&[], &[]).is_err());
    }

    #[test]
    fn labels_fall_back_to_index() {
        let obs = Observations::from_entries(vec![
            Observation { name: Some("teff".into()), value: 5777.0, uncertainty: 70.0 },
            Observation { name: None, value: 1.0, uncertainty: 0.1 },
        ])
        .unwrap();
        assert_eq!(obs.label(0), "teff");
        assert_eq!(obs.label(1), "obs1");
    }
}
