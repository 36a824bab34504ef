use nalgebra::DMatrix;
use pitchfork::error::AppResult;
use pitchfork::inference::{Forward, Inversion, Observations, Prior};
use pitchfork::sampler::StopReason;

/// Returns the first input column as the only observable.
struct FirstColumn;

impl Forward for FirstColumn {
    fn predict(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        Ok(inputs.columns(0, 1).into_owned())
    }

    fn output_width(&self) -> Option<usize> {
        Some(1)
    }
}

fn inversion() -> Inversion<FirstColumn> {
    let priors = vec![Prior::uniform(0.0, 1.0).unwrap(), Prior::uniform(0.0, 1.0).unwrap()];
    let observations = Observations::new(&[1.0], &[0.1]).unwrap();
    Inversion::new(priors, observations, FirstColumn).unwrap()
}

#[test]
fn small_run_produces_a_two_column_posterior() {
    let mut inv = inversion();
    let posterior = inv.run(50).unwrap().clone();

    assert!(posterior.nrows() > 0);
    assert_eq!(posterior.ncols(), 2);
    assert!(posterior.iter().all(|v| (0.0..=1.0).contains(v)));

    let results = inv.results().unwrap();
    assert_eq!(results.stop, StopReason::Converged);
    assert_eq!(posterior.nrows(), results.len());
    assert!(results.logz_final().is_finite());
}

#[test]
fn prior_transform_at_half_is_the_median() {
    let inv = inversion();
    assert_eq!(inv.prior_transform(&[0.5, 0.5]), vec![0.5, 0.5]);
}

#[test]
fn likelihood_is_highest_at_the_observation() {
    let inv = inversion();
    let at_obs = inv.log_likelihood(&[1.0, 0.3]).unwrap();
    let away = inv.log_likelihood(&[0.2, 0.3]).unwrap();
    assert!(at_obs > away);
    // The second parameter does not enter the model.
    assert_eq!(at_obs, inv.log_likelihood(&[1.0, 0.9]).unwrap());
}

#[test]
fn observation_count_must_match_the_model() {
    let priors = vec![Prior::uniform(0.0, 1.0).unwrap()];
    let observations = Observations::new(&[1.0, 2.0], &[0.1, 0.1]).unwrap();
    assert!(Inversion::new(priors, observations, FirstColumn).is_err());
}
