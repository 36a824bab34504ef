//! Run files: priors, observations and likelihood settings for `infer` (JSON).
//!
//! ```json
//! {
//!   "parameter_names": ["mass", "age"],
//!   "priors": [
//!     {"kind": "uniform", "low": 0.7, "high": 1.3},
//!     {"kind": "uniform", "low": 1.0, "high": 13.0}
//!   ],
//!   "observations": [
//!     {"name": "teff", "value": 5777.0, "uncertainty": 70.0}
//!   ],
//!   "logl_scale": 0.001,
//!   "policy": {"kind": "observables", "n_min": 6, "n_max": 40}
//! }
//! ```

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emulator::OutputPolicy;
use crate::error::{AppError, AppResult};
use crate::inference::{Observation, Observations, Prior, PriorSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    /// Display names, aligned with `priors`.
    #[serde(default)]
    pub parameter_names: Vec<String>,
    pub priors: Vec<PriorSpec>,
    pub observations: Vec<Observation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logl_scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<OutputPolicy>,
}

impl RunFile {
    pub fn priors(&self) -> AppResult<Vec<Prior>> {
        self.priors
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                Prior::new(*spec).map_err(|e| AppError::input(format!("Prior {i}: {}", e.message())))
            })
            .collect()
    }

    pub fn observations(&self) -> AppResult<Observations> {
        Observations::from_entries(self.observations.clone())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.priors.is_empty() {
            return Err(AppError::input("Run file lists no priors."));
        }
        if self.parameter_names.len() > self.priors.len() {
            return Err(AppError::input(format!(
                "Run file names {} parameters but has {} priors.",
                self.parameter_names.len(),
                self.priors.len()
            )));
        }
        Ok(())
    }
}

pub fn read_run_file(path: &Path) -> AppResult<RunFile> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open run file '{}': {e}", path.display())))?;
    let run: RunFile = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid run file '{}': {e}", path.display())))?;
    run.validate()?;
    Ok(run)
}
