//! Exports: posterior samples (CSV) and the run summary (JSON).

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use nalgebra::DMatrix;

use crate::domain::{RunSummaryFile, SamplerStats};
use crate::error::{AppError, AppResult};
use crate::io::table::write_table;
use crate::report::ParameterSummary;
use crate::sampler::SamplerResults;

/// Write equally weighted posterior samples, one column per parameter.
pub fn write_posterior_csv(path: &Path, posterior: &DMatrix<f64>, names: &[String]) -> AppResult<()> {
    write_table(path, names, posterior)
}

impl SamplerStats {
    pub fn from_results(results: &SamplerResults) -> Self {
        Self {
            nlive: results.nlive,
            niter: results.niter,
            ncall: results.ncall,
            efficiency: results.efficiency(),
            logz: results.logz_final(),
            logzerr: results.logzerr,
            information: results.information,
            stop: results.stop.label().to_string(),
        }
    }
}

/// Assemble a timestamped summary of a finished run.
pub fn build_summary(
    model: &str,
    seed: u64,
    logl_scale: f64,
    results: &SamplerResults,
    posterior_samples: usize,
    parameters: &[ParameterSummary],
) -> RunSummaryFile {
    RunSummaryFile {
        tool: "pitchfork".to_string(),
        created_at: Utc::now(),
        model: model.to_string(),
        seed,
        logl_scale,
        sampler: SamplerStats::from_results(results),
        posterior_samples,
        parameters: parameters.to_vec(),
    }
}

pub fn write_summary_json(path: &Path, summary: &RunSummaryFile) -> AppResult<()> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::input(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

pub fn read_summary_json(path: &Path) -> AppResult<RunSummaryFile> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid summary JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::StopReason;

    fn results() -> SamplerResults {
        SamplerResults {
            nlive: 2,
            niter: 1,
            ncall: 4,
            samples: vec![vec![0.1], vec![0.5], vec![0.9]],
            samples_u: vec![vec![0.1], vec![0.5], vec![0.9]],
            logl: vec![-2.0, -1.0, -0.5],
            logvol: vec![-0.5, -0.5, -0.5],
            logwt: vec![-3.0, -2.0, -1.5],
            logz: vec![-3.0, -1.7, -1.0],
            logzerr: 0.3,
            information: 0.2,
            stop: StopReason::Converged,
        }
    }

    #[test]
    fn summary_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let params = vec![ParameterSummary {
            name: "mass".to_string(),
            median: 1.0,
            lower: 0.9,
            upper: 1.1,
            mean: 1.0,
            std: 0.1,
        }];
        let summary = build_summary("toy", 7, 1e-3, &results(), 3, &params);
        write_summary_json(&path, &summary).unwrap();

        let back = read_summary_json(&path).unwrap();
        assert_eq!(back.tool, "pitchfork");
        assert_eq!(back.sampler.ncall, 4);
        assert_eq!(back.sampler.efficiency, 25.0);
        assert_eq!(back.sampler.stop, "converged");
        assert_eq!(back.parameters, params);
        assert_eq!(back.created_at, summary.created_at);
    }

    #[test]
    fn posterior_csv_has_named_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.csv");
        let posterior = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        write_posterior_csv(&path, &posterior, &["mass".to_string(), "age".to_string()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "mass,age\n1,2\n3,4\n");
    }
}
