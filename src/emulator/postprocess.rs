//! Output post-processing policies.
//!
//! Two emulator builds disagree on what `predict` returns:
//!
//! - [`OutputPolicy::Raw`]: the de-standardised outputs, unmodified.
//! - [`OutputPolicy::Observables`]: observables ready for comparison with
//!   data. Column 2 (surface metallicity) stays in dex, column 0 is replaced
//!   by the effective temperature derived from radius and luminosity, and
//!   only a window of the frequency columns is kept.
//!
//! The raw output layout is `[radius, luminosity, [Fe/H], ..., nu_*]`.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Nominal solar luminosity (W), IAU 2015 B3.
pub const L_SUN: f64 = 3.828e26;
/// Nominal solar radius (m), IAU 2015 B3.
pub const R_SUN: f64 = 6.957e8;
/// Stefan–Boltzmann constant (W m^-2 K^-4), CODATA 2018.
pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;

pub const DEFAULT_N_MIN: usize = 6;
pub const DEFAULT_N_MAX: usize = 40;

const RADIUS_COL: usize = 0;
const LUMINOSITY_COL: usize = 1;
const FEH_COL: usize = 2;
const CLASSICAL_KEEP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputPolicy {
    #[default]
    Raw,
    Observables {
        #[serde(default = "default_n_min")]
        n_min: usize,
        #[serde(default = "default_n_max")]
        n_max: usize,
    },
}

fn default_n_min() -> usize {
    DEFAULT_N_MIN
}

fn default_n_max() -> usize {
    DEFAULT_N_MAX
}

impl OutputPolicy {
    /// Observables policy with the default radial-order window.
    pub fn observables() -> Self {
        OutputPolicy::Observables {
            n_min: DEFAULT_N_MIN,
            n_max: DEFAULT_N_MAX,
        }
    }

    /// Number of columns produced from `raw_width` de-standardised outputs.
    pub fn output_width(&self, raw_width: usize) -> AppResult<usize> {
        match *self {
            OutputPolicy::Raw => Ok(raw_width),
            OutputPolicy::Observables { n_min, n_max } => {
                let (lo, hi) = window(n_min, n_max, raw_width)?;
                Ok(CLASSICAL_KEEP + (hi - lo))
            }
        }
    }

    /// Apply the policy.
    ///
    /// `log_outputs` are the de-standardised log10 outputs, `outputs` is `10^log_outputs`.
    pub fn apply(&self, log_outputs: &DMatrix<f64>, outputs: DMatrix<f64>) -> AppResult<DMatrix<f64>> {
        let OutputPolicy::Observables { n_min, n_max } = *self else {
            return Ok(outputs);
        };
        let (lo, hi) = window(n_min, n_max, outputs.ncols())?;

        let mut adjusted = outputs;
        for i in 0..adjusted.nrows() {
            let radius = adjusted[(i, RADIUS_COL)];
            let luminosity = adjusted[(i, LUMINOSITY_COL)];
            adjusted[(i, FEH_COL)] = log_outputs[(i, FEH_COL)];
            adjusted[(i, RADIUS_COL)] = effective_temperature(luminosity, radius);
        }

        let width = CLASSICAL_KEEP + (hi - lo);
        let mut out = DMatrix::zeros(adjusted.nrows(), width);
        out.columns_mut(0, CLASSICAL_KEEP)
            .copy_from(&adjusted.columns(0, CLASSICAL_KEEP));
        out.columns_mut(CLASSICAL_KEEP, hi - lo)
            .copy_from(&adjusted.columns(lo, hi - lo));
        Ok(out)
    }
}

/// Column range `[n_min - 3, n_max - 2)` of the raw outputs kept by the observables policy.
fn window(n_min: usize, n_max: usize, raw_width: usize) -> AppResult<(usize, usize)> {
    if raw_width < CLASSICAL_KEEP {
        return Err(AppError::data(format!(
            "Observables policy needs at least {CLASSICAL_KEEP} outputs, emulator has {raw_width}."
        )));
    }
    if n_min < CLASSICAL_KEEP || n_max < n_min {
        return Err(AppError::input(format!(
            "Invalid radial-order window n_min={n_min}, n_max={n_max} (need 3 <= n_min <= n_max)."
        )));
    }
    let lo = n_min - 3;
    let hi = n_max - 2;
    if hi > raw_width {
        return Err(AppError::input(format!(
            "Radial-order window n_max={n_max} needs {hi} outputs, emulator has {raw_width}."
        )));
    }
    Ok((lo, hi))
}

/// Stefan–Boltzmann effective temperature (K) from luminosity and radius in solar units.
pub fn effective_temperature(luminosity: f64, radius: f64) -> f64 {
    let r = radius * R_SUN;
    ((luminosity * L_SUN) / (4.0 * std::f64::consts::PI * STEFAN_BOLTZMANN * r * r)).powf(0.25)
}
