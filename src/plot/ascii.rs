//! ASCII histograms for terminal output.
//!
//! Fixed-size grid, optimized for:
//! - quick visual sanity checks of marginal posteriors in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each column of the grid is one bin; bars are drawn with `#`.

use nalgebra::DMatrix;

/// Render one histogram per posterior column.
pub fn render_posterior(posterior: &DMatrix<f64>, names: &[String], width: usize, height: usize) -> String {
    let mut out = String::new();
    for (j, name) in names.iter().enumerate().take(posterior.ncols()) {
        let values: Vec<f64> = posterior.column(j).iter().copied().collect();
        out.push_str(&render_histogram(name, &values, width, height));
        out.push('\n');
    }
    out
}

/// Render a histogram of `values` with `width` bins and `height` rows.
pub fn render_histogram(title: &str, values: &[f64], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(3);

    let Some((lo, hi)) = value_range(values) else {
        return format!("{title}: no finite samples\n");
    };

    let mut counts = vec![0usize; width];
    for &v in values.iter().filter(|v| v.is_finite()) {
        counts[map_x(v, lo, hi, width)] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(0).max(1);
    let bars: Vec<usize> = counts.iter().map(|&c| bar_height(c, peak, height)).collect();

    let mut out = String::new();
    out.push_str(&format!(
        "{title}: n={} | range=[{lo:.4}, {hi:.4}] | peak={peak}\n",
        values.len()
    ));
    for row in 0..height {
        let level = height - row;
        let line: String = bars.iter().map(|&b| if b >= level { '#' } else { ' ' }).collect();
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&"-".repeat(width));
    out.push('\n');

    let left = format!("{lo:.4}");
    let right = format!("{hi:.4}");
    let gap = width.saturating_sub(left.len() + right.len()).max(1);
    out.push_str(&format!("{left}{}{right}\n", " ".repeat(gap)));
    out
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min {
        Some((min, max))
    } else {
        Some(pad_range(min, max, 0.05))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs().max(min.abs());
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(v: f64, lo: f64, hi: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

/// Bar height in rows; non-empty bins get at least one row.
fn bar_height(count: usize, peak: usize, height: usize) -> usize {
    if count == 0 {
        return 0;
    }
    ((count as f64 / peak as f64 * height as f64).round() as usize).clamp(1, height)
}
