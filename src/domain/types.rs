//! Shared domain types.
//!
//! These types are kept lightweight and serialisable so they can be:
//!
//! - built from CLI flags and run files
//! - exported to JSON next to the posterior samples

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::emulator::OutputPolicy;
use crate::emulator::postprocess::{DEFAULT_N_MAX, DEFAULT_N_MIN};
use crate::report::ParameterSummary;

/// Which post-processing `predict` applies (CLI spelling of [`OutputPolicy`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// De-standardised outputs, unmodified.
    Raw,
    /// Teff in place of radius, [Fe/H] in dex, a window of frequencies.
    Observables,
}

impl PolicyKind {
    pub fn to_policy(self, n_min: Option<usize>, n_max: Option<usize>) -> OutputPolicy {
        match self {
            PolicyKind::Raw => OutputPolicy::Raw,
            PolicyKind::Observables => OutputPolicy::Observables {
                n_min: n_min.unwrap_or(DEFAULT_N_MIN),
                n_max: n_max.unwrap_or(DEFAULT_N_MAX),
            },
        }
    }
}

/// `pitchfork predict` as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct PredictConfig {
    pub model: PathBuf,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub policy: OutputPolicy,
}

/// `pitchfork infer` as understood by the pipeline.
///
/// Sampler knobs left as `None` fall back to the sampler defaults.
#[derive(Debug, Clone)]
pub struct InferConfig {
    pub model: PathBuf,
    pub run_file: PathBuf,
    pub nlive: usize,
    pub seed: u64,
    pub walks: Option<usize>,
    pub dlogz: Option<f64>,
    pub max_iter: Option<usize>,
    /// Overrides the run file's policy when set.
    pub policy: Option<OutputPolicy>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_samples: Option<PathBuf>,
    pub export_summary: Option<PathBuf>,
}

/// `pitchfork validate` as understood by the pipeline.
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    pub model: PathBuf,
    pub input: PathBuf,
    pub expected: PathBuf,
}

/// Sampler statistics of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerStats {
    pub nlive: usize,
    pub niter: usize,
    pub ncall: usize,
    /// Percent.
    pub efficiency: f64,
    pub logz: f64,
    pub logzerr: f64,
    pub information: f64,
    pub stop: String,
}

/// A saved run summary (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummaryFile {
    pub tool: String,
    pub created_at: DateTime<Utc>,
    pub model: String,
    pub seed: u64,
    pub logl_scale: f64,
    pub sampler: SamplerStats,
    pub posterior_samples: usize,
    pub parameters: Vec<ParameterSummary>,
}
