//! Stellar emulator: scaling pipeline around the trained network.
//!
//! `predict` maps raw stellar parameters to observables:
//!
//! 1. `log10` of the inputs (inputs must be strictly positive)
//! 2. standardise with the input statistics
//! 3. evaluate the network (classical and astero heads, concatenated)
//! 4. de-standardise with the output statistics and undo the log
//! 5. apply the configured [`OutputPolicy`]
//!
//! Large batches are split into row chunks evaluated in parallel.

use std::path::Path;

use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::inference::Forward;
use crate::math::{Scaler, exp10, log10_positive};
use crate::nn::{Network, Wmse};

pub mod artifact;
pub mod postprocess;

pub use artifact::{EmulatorMetadata, NetworkFile, ParameterRange};
pub use postprocess::OutputPolicy;

/// Rows per parallel chunk in batch prediction.
const CHUNK_ROWS: usize = 1024;

#[derive(Debug, Clone)]
pub struct Emulator {
    name: String,
    ranges: Vec<ParameterRange>,
    input_scaler: Scaler,
    output_scaler: Scaler,
    network: Network,
    wmse: Wmse,
    policy: OutputPolicy,
}

impl Emulator {
    /// Load `<base>.json` and `<base>.network.json`.
    pub fn load(base: impl AsRef<Path>) -> AppResult<Self> {
        let base = base.as_ref();
        let metadata = artifact::read_metadata(&artifact::metadata_path(base))?;
        let network = artifact::read_network(&artifact::network_path(base))?;
        let name = base
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| base.display().to_string());
        Self::from_parts(name, &metadata, &network)
    }

    /// Build an emulator from already-parsed artifacts.
    pub fn from_parts(name: impl Into<String>, metadata: &EmulatorMetadata, network: &NetworkFile) -> AppResult<Self> {
        let name = name.into();
        let scaling = &metadata.data_scaling;
        let input_scaler = Scaler::new(scaling.inp_mean.clone(), scaling.inp_std.clone())?;
        let classical = Scaler::new(
            scaling.classical_out_mean.clone(),
            scaling.classical_out_std.clone(),
        )?;
        let astero = Scaler::new(scaling.astero_out_mean.clone(), scaling.astero_out_std.clone())?;
        let output_scaler = classical.concat(&astero);

        let wmse = Wmse::new(metadata.custom_objects.wmse.weights.clone())?;
        let network = artifact::build_network(network, metadata)?;

        if network.inputs() != input_scaler.len() {
            return Err(AppError::input(format!(
                "Network takes {} inputs but input scaling covers {}.",
                network.inputs(),
                input_scaler.len()
            )));
        }
        if network.classical_width() != classical.len() || network.astero_width() != astero.len() {
            return Err(AppError::input(format!(
                "Network heads produce {}+{} outputs but output scaling covers {}+{}.",
                network.classical_width(),
                network.astero_width(),
                classical.len(),
                astero.len()
            )));
        }
        if metadata.parameter_ranges.len() != input_scaler.len() {
            return Err(AppError::input(format!(
                "Metadata declares {} parameter ranges for {} inputs.",
                metadata.parameter_ranges.len(),
                input_scaler.len()
            )));
        }

        let emulator = Self {
            name,
            ranges: metadata.parameter_ranges.clone(),
            input_scaler,
            output_scaler,
            network,
            wmse,
            policy: OutputPolicy::Raw,
        };
        for line in emulator.describe_ranges() {
            info!("{line}");
        }
        Ok(emulator)
    }

    /// Switch the output post-processing policy.
    pub fn with_policy(mut self, policy: OutputPolicy) -> AppResult<Self> {
        policy.output_width(self.raw_output_width())?;
        self.policy = policy;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> OutputPolicy {
        self.policy
    }

    pub fn parameter_ranges(&self) -> &[ParameterRange] {
        &self.ranges
    }

    /// One line per parameter: `"<name> range: [min = .., max = ..]"`.
    pub fn describe_ranges(&self) -> Vec<String> {
        self.ranges.iter().map(ParameterRange::describe).collect()
    }

    pub fn input_width(&self) -> usize {
        self.input_scaler.len()
    }

    /// Width of the de-standardised outputs before post-processing.
    pub fn raw_output_width(&self) -> usize {
        self.output_scaler.len()
    }

    /// Width of `predict` results under the current policy.
    pub fn output_width(&self) -> usize {
        // Validated in `with_policy`; `Raw` cannot fail.
        self.policy
            .output_width(self.raw_output_width())
            .unwrap_or(self.raw_output_width())
    }

    pub fn input_scaler(&self) -> &Scaler {
        &self.input_scaler
    }

    pub fn output_scaler(&self) -> &Scaler {
        &self.output_scaler
    }

    pub fn wmse(&self) -> &Wmse {
        &self.wmse
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Predict observables for a batch of strictly positive inputs (rows = samples).
    pub fn predict(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        self.check_inputs(inputs)?;
        let n = inputs.nrows();
        if n <= CHUNK_ROWS {
            return self.predict_rows(inputs);
        }

        debug!(rows = n, chunk = CHUNK_ROWS, "batch prediction");
        let starts: Vec<usize> = (0..n).step_by(CHUNK_ROWS).collect();
        let chunks: Vec<DMatrix<f64>> = starts
            .par_iter()
            .map(|&start| {
                let len = CHUNK_ROWS.min(n - start);
                self.predict_rows(&inputs.rows(start, len).into_owned())
            })
            .collect::<AppResult<Vec<_>>>()?;

        let mut out = DMatrix::zeros(n, self.output_width());
        for (&start, chunk) in starts.iter().zip(&chunks) {
            out.rows_mut(start, chunk.nrows()).copy_from(chunk);
        }
        Ok(out)
    }

    /// Network outputs in standardised log space (classical then astero).
    pub fn standardized_log_outputs(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        self.check_inputs(inputs)?;
        let z = self.input_scaler.standardize(&log10_positive(inputs)?)?;
        self.network.forward_concat(&z)
    }

    fn predict_rows(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        let z_out = self.standardized_log_outputs(inputs)?;
        let log_outputs = self.output_scaler.destandardize(&z_out)?;
        let outputs = exp10(&log_outputs);
        self.policy.apply(&log_outputs, outputs)
    }

    fn check_inputs(&self, inputs: &DMatrix<f64>) -> AppResult<()> {
        if inputs.ncols() != self.input_width() {
            return Err(AppError::data(format!(
                "Input has {} columns, emulator '{}' expects {}.",
                inputs.ncols(),
                self.name,
                self.input_width()
            )));
        }
        Ok(())
    }

    /// Score predictions against reference outputs (raw, de-standardised units).
    ///
    /// Both sides are compared in standardised log space, where the WMSE weights
    /// were defined. The weights are matched to the full output block or to one
    /// head by width; if none matches only the per-column RMSE is reported.
    pub fn validate(&self, inputs: &DMatrix<f64>, expected: &DMatrix<f64>) -> AppResult<ValidationReport> {
        if expected.nrows() != inputs.nrows() || expected.ncols() != self.raw_output_width() {
            return Err(AppError::data(format!(
                "Reference outputs are {}x{}, expected {}x{}.",
                expected.nrows(),
                expected.ncols(),
                inputs.nrows(),
                self.raw_output_width()
            )));
        }
        let predicted = self.standardized_log_outputs(inputs)?;
        let truth = self.output_scaler.standardize(&log10_positive(expected)?)?;

        let classical = self.network.classical_width();
        let astero = self.network.astero_width();
        let block = if self.wmse.len() == predicted.ncols() {
            Some((0, predicted.ncols()))
        } else if self.wmse.len() == astero {
            Some((classical, astero))
        } else if self.wmse.len() == classical {
            Some((0, classical))
        } else {
            None
        };
        let wmse = match block {
            Some((start, len)) => Some(self.wmse.loss(
                &truth.columns(start, len).into_owned(),
                &predicted.columns(start, len).into_owned(),
            )?),
            None => None,
        };

        let n = inputs.nrows().max(1) as f64;
        let rmse = (0..predicted.ncols())
            .map(|j| {
                let sse: f64 = (0..predicted.nrows())
                    .map(|i| (truth[(i, j)] - predicted[(i, j)]).powi(2))
                    .sum();
                (sse / n).sqrt()
            })
            .collect();

        Ok(ValidationReport {
            rows: inputs.nrows(),
            wmse,
            rmse_per_output: rmse,
        })
    }
}

impl Forward for Emulator {
    fn predict(&self, inputs: &DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        Emulator::predict(self, inputs)
    }

    fn output_width(&self) -> Option<usize> {
        Some(Emulator::output_width(self))
    }
}

/// Agreement between emulator predictions and a reference set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub rows: usize,
    /// `None` when the WMSE weights match neither the full output nor a head.
    pub wmse: Option<f64>,
    /// RMSE per output column in standardised log space.
    pub rmse_per_output: Vec<f64>,
}
