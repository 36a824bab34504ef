//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - installs logging and the thread pool
//! - parses CLI arguments into run configurations
//! - runs the pipeline for the chosen command
//! - prints reports/histograms and writes optional exports

use clap::Parser;

use crate::cli::{Command, InferArgs, PolicyArgs, PredictArgs, ValidateArgs};
use crate::config::RuntimeConfig;
use crate::domain::{InferConfig, PredictConfig, ValidateConfig};
use crate::emulator::{Emulator, OutputPolicy};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `pitchfork` binary.
pub fn run() -> Result<(), AppError> {
    RuntimeConfig::from_env()?.install()?;
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Ranges(args) => handle_ranges(&args.model),
        Command::Predict(args) => handle_predict(args),
        Command::Infer(args) => handle_infer(args),
        Command::Validate(args) => handle_validate(args),
    }
}

fn handle_ranges(model: &std::path::Path) -> Result<(), AppError> {
    let emulator = Emulator::load(model)?;
    println!(
        "{}",
        crate::report::format_ranges(emulator.name(), emulator.parameter_ranges())
    );
    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = predict_config_from_args(&args);
    let outputs = pipeline::run_predict(&config)?;
    if config.output.is_none() {
        print!("{}", crate::report::format_predictions(&outputs));
    }
    Ok(())
}

fn handle_infer(args: InferArgs) -> Result<(), AppError> {
    let config = infer_config_from_args(&args);
    let run = pipeline::run_inference(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &run.model_name,
            &run.results,
            run.posterior.nrows(),
            &run.summaries
        )
    );
    if let Some(predicted) = &run.median_prediction {
        println!(
            "{}",
            crate::report::format_observation_check(&run.observations, predicted)
        );
    }

    if config.plot {
        print!(
            "{}",
            crate::plot::render_posterior(
                &run.posterior,
                &run.names,
                config.plot_width,
                config.plot_height
            )
        );
    }

    // Optional exports.
    if let Some(path) = &config.export_samples {
        crate::io::export::write_posterior_csv(path, &run.posterior, &run.names)?;
    }
    if let Some(path) = &config.export_summary {
        let summary = crate::io::export::build_summary(
            &run.model_name,
            config.seed,
            run.logl_scale,
            &run.results,
            run.posterior.nrows(),
            &run.summaries,
        );
        crate::io::export::write_summary_json(path, &summary)?;
    }

    Ok(())
}

fn handle_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = ValidateConfig {
        model: args.model.model,
        input: args.input,
        expected: args.expected,
    };
    let (emulator, report) = pipeline::run_validate(&config)?;
    println!("{}", crate::report::format_validation(&emulator, &report));
    Ok(())
}

/// Resolve the policy flags; `None` when `--policy` was not given.
pub fn policy_from_args(args: &PolicyArgs) -> Option<OutputPolicy> {
    args.policy.map(|kind| kind.to_policy(args.n_min, args.n_max))
}

pub fn predict_config_from_args(args: &PredictArgs) -> PredictConfig {
    PredictConfig {
        model: args.model.model.clone(),
        input: args.input.clone(),
        output: args.output.clone(),
        policy: policy_from_args(&args.policy).unwrap_or_default(),
    }
}

pub fn infer_config_from_args(args: &InferArgs) -> InferConfig {
    InferConfig {
        model: args.model.model.clone(),
        run_file: args.run_file.clone(),
        nlive: args.nlive,
        seed: args.seed,
        walks: args.walks,
        dlogz: args.dlogz,
        max_iter: args.max_iter,
        policy: policy_from_args(&args.policy),
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_samples: args.export.clone(),
        export_summary: args.export_summary.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn infer_args(argv: &[&str]) -> InferArgs {
        let mut full = vec!["pitchfork", "infer", "-m", "base", "--run", "star.json"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::Infer(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn no_plot_wins() {
        assert!(infer_config_from_args(&infer_args(&[])).plot);
        assert!(!infer_config_from_args(&infer_args(&["--no-plot"])).plot);
    }

    #[test]
    fn policy_window_defaults() {
        let config = infer_config_from_args(&infer_args(&["--policy", "observables", "--n-min", "8"]));
        assert_eq!(
            config.policy,
            Some(OutputPolicy::Observables { n_min: 8, n_max: 40 })
        );
        assert_eq!(infer_config_from_args(&infer_args(&[])).policy, None);
    }
}
