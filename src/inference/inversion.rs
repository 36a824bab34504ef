//! Binds priors, observations and a forward model into a nested-sampling run.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::inference::forward::Forward;
use crate::inference::likelihood::{DEFAULT_LOGL_SCALE, Observations};
use crate::inference::prior::Prior;
use crate::sampler::{NestedSampler, SamplerOptions, SamplerResults, resample_equal};

/// Default number of live points for [`Inversion::run`].
pub const DEFAULT_NLIVE: usize = 500;

pub struct Inversion<F: Forward> {
    priors: Vec<Prior>,
    observations: Observations,
    forward: F,
    logl_scale: f64,
    results: Option<SamplerResults>,
    posterior: Option<DMatrix<f64>>,
}

impl<F: Forward> Inversion<F> {
    pub fn new(priors: Vec<Prior>, observations: Observations, forward: F) -> AppResult<Self> {
        if priors.is_empty() {
            return Err(AppError::input("At least one prior is required."));
        }
        if let Some(width) = forward.output_width() {
            if width != observations.len() {
                return Err(AppError::data(format!(
                    "Model produces {width} outputs but {} observations were given.",
                    observations.len()
                )));
            }
        }
        Ok(Self {
            priors,
            observations,
            forward,
            logl_scale: DEFAULT_LOGL_SCALE,
            results: None,
            posterior: None,
        })
    }

    pub fn with_logl_scale(mut self, scale: f64) -> AppResult<Self> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(AppError::input(format!("logl_scale must be > 0, got {scale}.")));
        }
        self.logl_scale = scale;
        Ok(self)
    }

    pub fn ndim(&self) -> usize {
        self.priors.len()
    }

    pub fn priors(&self) -> &[Prior] {
        &self.priors
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn logl_scale(&self) -> f64 {
        self.logl_scale
    }

    /// Map unit-cube coordinates to parameters through each prior's inverse CDF.
    ///
    /// # Panics
    ///
    /// If `u` does not hold exactly one coordinate per prior.
    pub fn prior_transform(&self, u: &[f64]) -> Vec<f64> {
        assert_eq!(u.len(), self.ndim(), "unit-cube point has the wrong dimension");
        self.priors.iter().zip(u).map(|(p, &x)| p.ppf(x)).collect()
    }

    /// Scaled Gaussian log-likelihood of `theta` against the observations.
    pub fn log_likelihood(&self, theta: &[f64]) -> AppResult<f64> {
        if theta.len() != self.ndim() {
            return Err(AppError::data(format!(
                "Expected {} parameters, got {}.",
                self.ndim(),
                theta.len()
            )));
        }
        let input = DMatrix::from_row_slice(1, theta.len(), theta);
        let predicted = self.forward.predict(&input)?;
        if predicted.nrows() != 1 {
            return Err(AppError::data(format!(
                "Model returned {} rows for a single parameter vector.",
                predicted.nrows()
            )));
        }
        let row: Vec<f64> = predicted.row(0).iter().copied().collect();
        Ok(self.observations.log_density(&row)? * self.logl_scale)
    }

    /// Sample with `nlive` live points and otherwise default options.
    pub fn run(&mut self, nlive: usize) -> AppResult<&DMatrix<f64>> {
        self.run_with(SamplerOptions::new(nlive))
    }

    /// Run the sampler and resample its output to an equally weighted posterior.
    pub fn run_with(&mut self, options: SamplerOptions) -> AppResult<&DMatrix<f64>> {
        let sampler = NestedSampler::new(self.ndim(), options)?;
        let results = sampler.run(|u| self.prior_transform(u), |theta| self.log_likelihood(theta))?;

        let weights = results.importance_weights();
        let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(1));
        let posterior = resample_equal(&results.samples, &weights, &mut rng)?;
        info!(
            samples = posterior.nrows(),
            logz = results.logz_final(),
            "posterior resampled"
        );

        self.results = Some(results);
        Ok(self.posterior.insert(posterior))
    }

    /// Raw sampler output of the last run.
    pub fn results(&self) -> Option<&SamplerResults> {
        self.results.as_ref()
    }

    /// Equally weighted posterior of the last run.
    pub fn posterior(&self) -> Option<&DMatrix<f64>> {
        self.posterior.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::prior::PriorSpec;

    /// Returns the inputs unchanged.
    struct Identity;

    impl Forward for Identity {
        fn predict(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
            Ok(inputs.clone())
        }
    }

    fn inversion() -> Inversion<Identity> {
        let priors = vec![
            Prior::uniform(0.7, 1.3).unwrap(),
            Prior::new(PriorSpec::Normal { mean: 0.0, std_dev: 0.1 }).unwrap(),
        ];
        let obs = Observations::new(&[1.0, 0.05], &[0.05, 0.02]).unwrap();
        Inversion::new(priors, obs, Identity).unwrap()
    }

    #[test]
    fn prior_transform_at_half_gives_medians() {
        let inv = inversion();
        let theta = inv.prior_transform(&[0.5, 0.5]);
        assert!((theta[0] - 1.0).abs() < 1e-12);
        assert!(theta[1].abs() < 1e-3);
    }

    #[test]
    #[should_panic(expected = "wrong dimension")]
    fn short_unit_cube_point_panics() {
        inversion().prior_transform(&[0.5]);
    }

    #[test]
    fn likelihood_peaks_at_the_observations() {
        let inv = inversion();
        let best = inv.log_likelihood(&[1.0, 0.05]).unwrap();
        assert!(inv.log_likelihood(&[1.1, 0.05]).unwrap() < best);
        assert!(inv.log_likelihood(&[1.0, 0.0]).unwrap() < best);
    }

    #[test]
    fn likelihood_is_scaled() {
        let inv = inversion();
        let raw = inv.observations().log_density(&[0.9, 0.0]).unwrap();
        let scaled = inv.log_likelihood(&[0.9, 0.0]).unwrap();
        assert!((scaled - raw * DEFAULT_LOGL_SCALE).abs() < 1e-12);

        let inv = inversion().with_logl_scale(1.0).unwrap();
        assert!((inv.log_likelihood(&[0.9, 0.0]).unwrap() - raw).abs() < 1e-12);
    }

    #[test]
    fn wrong_parameter_count_is_rejected() {
        let err = inversion().log_likelihood(&[1.0]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_DATA);
    }

    #[test]
    fn run_keeps_results_and_posterior() {
        let mut inv = inversion().with_logl_scale(1.0).unwrap();
        let options = SamplerOptions {
            seed: 11,
            ..SamplerOptions::new(80)
        };
        let (rows, cols) = inv.run_with(options).unwrap().shape();
        assert_eq!(cols, 2);
        let results = inv.results().unwrap();
        assert_eq!(rows, results.len());
        assert!(inv.posterior().is_some());
    }

    #[test]
    fn no_priors_is_an_input_error() {
        let obs = Observations::new(&[1.0], &[0.1]).unwrap();
        let err = Inversion::new(Vec::new(), obs, Identity).err().unwrap();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
