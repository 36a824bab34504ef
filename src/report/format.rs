//! Formatted terminal output.
//!
//! All formatting lives here so the numerical code stays clean and output
//! changes stay localized.

use nalgebra::DMatrix;

use crate::emulator::{Emulator, ParameterRange, ValidationReport};
use crate::inference::Observations;
use crate::report::ParameterSummary;
use crate::sampler::SamplerResults;

/// Sampler statistics followed by the posterior parameter table.
pub fn format_run_summary(
    model: &str,
    results: &SamplerResults,
    posterior_rows: usize,
    summaries: &[ParameterSummary],
) -> String {
    let mut out = String::new();

    out.push_str("=== pitchfork - nested sampling inversion ===\n");
    out.push_str(&format!("Model: {model}\n"));
    out.push_str(&format!(
        "Sampler: nlive={} | niter={} | ncall={} | eff={:.2}% | stop={}\n",
        results.nlive,
        results.niter,
        results.ncall,
        results.efficiency(),
        results.stop.label(),
    ));
    out.push_str(&format!(
        "Evidence: logz={:.4} +/- {:.4} | H={:.4} nats\n",
        results.logz_final(),
        results.logzerr,
        results.information,
    ));
    out.push_str(&format!("Posterior: {posterior_rows} equally weighted samples\n"));

    out.push_str("\nParameters:\n");
    out.push_str(&format_parameter_table(summaries));
    out
}

pub fn format_parameter_table(summaries: &[ParameterSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "name", "median", "p16", "p84", "mean", "std"
    ));
    out.push('\n');
    out.push_str(&format!(
        "{:-<16} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12}",
        "", "", "", "", "", ""
    ));
    out.push('\n');

    for s in summaries {
        out.push_str(&format!(
            "{:<16} {:>12} {:>12} {:>12} {:>12} {:>12}",
            truncate(&s.name, 16),
            fmt_num(s.median),
            fmt_num(s.lower),
            fmt_num(s.upper),
            fmt_num(s.mean),
            fmt_num(s.std),
        ));
        out.push('\n');
    }
    out
}

/// Observed values next to the model prediction at the posterior medians.
pub fn format_observation_check(observations: &Observations, predicted: &[f64]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:>12} {:>12} {:>12} {:>8}",
        "observable", "observed", "sigma", "model", "pull"
    ));
    out.push('\n');
    for (i, (o, &m)) in observations.entries().iter().zip(predicted).enumerate() {
        out.push_str(&format!(
            "{:<16} {:>12} {:>12} {:>12} {:>8.2}",
            truncate(&observations.label(i), 16),
            fmt_num(o.value),
            fmt_num(o.uncertainty),
            fmt_num(m),
            (m - o.value) / o.uncertainty,
        ));
        out.push('\n');
    }
    out
}

pub fn format_ranges(emulator_name: &str, ranges: &[ParameterRange]) -> String {
    let mut out = format!("Parameter ranges for {emulator_name}:\n");
    for r in ranges {
        out.push_str(&format!("- {}\n", r.describe()));
    }
    out
}

/// One line per row, space-separated.
pub fn format_predictions(outputs: &DMatrix<f64>) -> String {
    let mut out = String::new();
    for row in outputs.row_iter() {
        let cells: Vec<String> = row.iter().map(|v| fmt_num(*v)).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

pub fn format_validation(emulator: &Emulator, report: &ValidationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Validation of {} on {} rows:\n",
        emulator.name(),
        report.rows
    ));
    match report.wmse {
        Some(w) => out.push_str(&format!("WMSE (standardised log space): {w:.6}\n")),
        None => out.push_str("WMSE: n/a (loss weights match no output block)\n"),
    }
    let worst = report
        .rmse_per_output
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1));
    if let Some((j, rmse)) = worst {
        out.push_str(&format!("Worst output: column {j} (RMSE {rmse:.6})\n"));
    }
    out.push_str(&format!("RMSE per output: {}\n", fmt_vec(&report.rmse_per_output)));
    out
}

fn fmt_num(v: f64) -> String {
    let a = v.abs();
    if v == 0.0 || (1e-3..1e5).contains(&a) {
        format!("{v:.4}")
    } else {
        format!("{v:.4e}")
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
