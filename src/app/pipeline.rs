//! Shared pipeline logic behind the CLI commands.
//!
//! Keeping the workflows here keeps `app` focused on presentation:
//! artifacts -> emulator -> (predict | inversion -> resample -> summaries)

use nalgebra::DMatrix;
use tracing::{info, warn};

use crate::domain::{InferConfig, PredictConfig, ValidateConfig};
use crate::emulator::{Emulator, ValidationReport};
use crate::error::{AppError, AppResult};
use crate::inference::{Forward, Inversion, Observations};
use crate::io::{default_headers, read_run_file, read_table, write_table};
use crate::report::{ParameterSummary, parameter_names, summarize};
use crate::sampler::{SamplerOptions, SamplerResults};

/// All computed outputs of a single `pitchfork infer` run.
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub model_name: String,
    pub names: Vec<String>,
    pub observations: Observations,
    pub logl_scale: f64,
    pub results: SamplerResults,
    pub posterior: DMatrix<f64>,
    pub summaries: Vec<ParameterSummary>,
    /// Emulator output at the posterior medians.
    pub median_prediction: Option<Vec<f64>>,
}

/// Evaluate the emulator on an input CSV; writes the output CSV when configured.
pub fn run_predict(config: &PredictConfig) -> AppResult<DMatrix<f64>> {
    let emulator = Emulator::load(&config.model)?.with_policy(config.policy)?;
    let table = read_table(&config.input)?;
    let outputs = emulator.predict(&table.values)?;
    info!(rows = outputs.nrows(), cols = outputs.ncols(), "prediction finished");

    if let Some(path) = &config.output {
        write_table(path, &default_headers("y", outputs.ncols()), &outputs)?;
    }
    Ok(outputs)
}

/// Load the emulator and run file, sample, resample and summarise.
pub fn run_inference(config: &InferConfig) -> AppResult<InferenceOutput> {
    let run = read_run_file(&config.run_file)?;
    let policy = config.policy.or(run.policy).unwrap_or_default();
    let emulator = Emulator::load(&config.model)?.with_policy(policy)?;

    let priors = run.priors()?;
    if priors.len() != emulator.input_width() {
        return Err(AppError::input(format!(
            "Run file has {} priors but the emulator takes {} inputs.",
            priors.len(),
            emulator.input_width()
        )));
    }
    let names = parameter_names(&run.parameter_names, priors.len());
    let observations = run.observations()?;

    let mut inversion = Inversion::new(priors, observations.clone(), &emulator)?;
    if let Some(scale) = run.logl_scale {
        inversion = inversion.with_logl_scale(scale)?;
    }
    let logl_scale = inversion.logl_scale();

    let defaults = SamplerOptions::new(config.nlive);
    let options = SamplerOptions {
        seed: config.seed,
        walks: config.walks.unwrap_or(defaults.walks),
        dlogz: config.dlogz,
        max_iter: config.max_iter,
        ..defaults
    };
    let posterior = inversion.run_with(options)?.clone();
    let results = inversion
        .results()
        .cloned()
        .ok_or_else(|| AppError::numeric("Sampler finished without results."))?;

    let summaries = summarize(&posterior, &names)?;
    let medians: Vec<f64> = summaries.iter().map(|s| s.median).collect();
    let median_prediction = prediction_at(&emulator, &medians);

    Ok(InferenceOutput {
        model_name: emulator.name().to_string(),
        names,
        observations,
        logl_scale,
        results,
        posterior,
        summaries,
        median_prediction,
    })
}

/// Model output at a single point. A failure is logged and yields `None`, since
/// the median prediction is an optional addition to the report.
fn prediction_at<F: Forward>(model: &F, point: &[f64]) -> Option<Vec<f64>> {
    match model.predict(&DMatrix::from_row_slice(1, point.len(), point)) {
        Ok(m) => Some(m.row(0).iter().copied().collect()),
        Err(e) => {
            warn!(error = %e, "prediction at the posterior medians failed");
            None
        }
    }
}

/// Compare emulator predictions with a reference output table.
pub fn run_validate(config: &ValidateConfig) -> AppResult<(Emulator, ValidationReport)> {
    let emulator = Emulator::load(&config.model)?;
    let inputs = read_table(&config.input)?;
    let expected = read_table(&config.expected)?;
    let report = emulator.validate(&inputs.values, &expected.values)?;
    Ok((emulator, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Doubles its inputs, rejecting anything non-positive.
    struct Doubler;

    impl Forward for Doubler {
        fn predict(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
            if inputs.iter().any(|v| *v <= 0.0) {
                return Err(AppError::data("Inputs must be strictly positive."));
            }
            Ok(inputs * 2.0)
        }
    }

    #[test]
    fn prediction_at_returns_the_single_row() {
        assert_eq!(prediction_at(&Doubler, &[1.0, 3.0]), Some(vec![2.0, 6.0]));
    }

    #[test]
    fn failed_prediction_at_is_dropped() {
        assert_eq!(prediction_at(&Doubler, &[1.0, -3.0]), None);
    }
}
