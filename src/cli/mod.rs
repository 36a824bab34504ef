//! Command-line parsing for the emulator and inversion front-end.
//!
//! Argument parsing and command dispatch stay separate from the numerical code;
//! `app` turns these structs into plain run configurations.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::PolicyKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "pitchfork",
    version,
    about = "Stellar emulator and nested-sampling parameter inference"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the parameter ranges the emulator was trained on.
    Ranges(ModelArgs),
    /// Evaluate the emulator on a CSV of input parameters.
    Predict(PredictArgs),
    /// Infer posterior parameter distributions for one star.
    Infer(InferArgs),
    /// Score the emulator against a reference dataset (WMSE).
    Validate(ValidateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Artifact base path: reads `<base>.json` and `<base>.network.json`.
    #[arg(short = 'm', long, value_name = "BASE")]
    pub model: PathBuf,
}

/// Output post-processing options shared by `predict` and `infer`.
#[derive(Debug, Args, Clone)]
pub struct PolicyArgs {
    /// Post-processing applied to the emulator outputs.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyKind>,

    /// First radial order kept by the observables policy.
    #[arg(long)]
    pub n_min: Option<usize>,

    /// Last radial order (exclusive bound + 2) kept by the observables policy.
    #[arg(long)]
    pub n_max: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// CSV of strictly positive input parameters (header row required).
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Write predictions to CSV instead of printing them.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Debug, Args, Clone)]
pub struct InferArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Run file (JSON) with priors and observations.
    #[arg(short = 'r', long = "run", value_name = "JSON")]
    pub run_file: PathBuf,

    /// Number of live points.
    #[arg(long, default_value_t = crate::inference::DEFAULT_NLIVE)]
    pub nlive: usize,

    /// Random seed for the sampler.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Minimum likelihood calls per random walk.
    #[arg(long)]
    pub walks: Option<usize>,

    /// Stopping threshold on the remaining log-evidence.
    #[arg(long)]
    pub dlogz: Option<f64>,

    /// Stop after this many iterations.
    #[arg(long)]
    pub max_iter: Option<usize>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Render ASCII histograms of the marginal posteriors (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the histograms.
    #[arg(long)]
    pub no_plot: bool,

    /// Histogram width (bins).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Histogram height (rows).
    #[arg(long, default_value_t = 8)]
    pub height: usize,

    /// Export the equally weighted posterior samples to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the run summary to JSON.
    #[arg(long = "export-summary", value_name = "JSON")]
    pub export_summary: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// CSV of input parameters.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// CSV of reference outputs, one row per input row.
    #[arg(short = 'e', long, value_name = "CSV")]
    pub expected: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_infer_with_defaults() {
        let cli = Cli::parse_from(["pitchfork", "infer", "-m", "emu/base", "--run", "star.json", "--no-plot"]);
        let Command::Infer(args) = cli.command else {
            panic!("expected infer");
        };
        assert_eq!(args.nlive, 500);
        assert_eq!(args.seed, 0);
        assert!(args.no_plot);
        assert_eq!(args.policy.policy, None);
    }

    #[test]
    fn parses_predict_policy() {
        let cli = Cli::parse_from([
            "pitchfork", "predict", "-m", "base", "-i", "in.csv", "--policy", "observables", "--n-max", "30",
        ]);
        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.policy.policy, Some(PolicyKind::Observables));
        assert_eq!(args.policy.n_max, Some(30));
    }
}
