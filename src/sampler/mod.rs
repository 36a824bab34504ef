//! Static nested sampling.
//!
//! The sampler keeps `nlive` points drawn from the prior (through the prior
//! transform of unit-cube coordinates). Each iteration:
//!
//! 1. removes the live point with the lowest likelihood `L*`, assigning it the
//!    prior-volume shell `X_{i-1} - X_i` with `ln X_i = -i / nlive`
//! 2. accumulates the evidence `Z` and information `H`
//! 3. replaces it with a new point satisfying `L > L*`
//!
//! New points come from uniform draws in the unit cube until the first bound
//! update, then from random walks shaped by a bounding ellipsoid over the
//! live points. The run stops once the live points can no longer change
//! `ln Z` by more than `dlogz`; the remaining live points are then added with
//! equal shares of the last volume.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::math::logaddexp;

pub mod ellipsoid;
pub mod resample;
mod rwalk;

pub use ellipsoid::Ellipsoid;
pub use resample::{resample_equal, resample_indices};

/// Uniform draws attempted per replacement before switching to the bound.
const UNIFORM_TRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerOptions {
    pub nlive: usize,
    /// Minimum likelihood calls per random walk.
    pub walks: usize,
    /// Stopping threshold on the remaining evidence; `None` uses
    /// `1e-3 * (nlive - 1) + 0.01`.
    pub dlogz: Option<f64>,
    pub max_iter: Option<usize>,
    pub max_call: Option<usize>,
    /// Volume enlargement of the bounding ellipsoid.
    pub enlarge: f64,
    /// Iterations between bound updates; `None` uses `0.6 * nlive`.
    pub update_interval: Option<usize>,
    /// Likelihood calls before the bound is first used; `None` uses `2 * nlive`.
    pub first_update: Option<usize>,
    pub seed: u64,
    /// Iterations between progress log lines (0 disables them).
    pub log_every: usize,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            nlive: 500,
            walks: 25,
            dlogz: None,
            max_iter: None,
            max_call: None,
            enlarge: 1.25,
            update_interval: None,
            first_update: None,
            seed: 0,
            log_every: 1000,
        }
    }
}

impl SamplerOptions {
    pub fn new(nlive: usize) -> Self {
        Self {
            nlive,
            ..Self::default()
        }
    }

    pub fn dlogz_threshold(&self) -> f64 {
        self.dlogz
            .unwrap_or(1e-3 * (self.nlive.saturating_sub(1)) as f64 + 0.01)
    }

    fn update_every(&self) -> usize {
        self.update_interval
            .unwrap_or((0.6 * self.nlive as f64).round() as usize)
            .max(1)
    }

    fn first_update_calls(&self) -> usize {
        self.first_update.unwrap_or(2 * self.nlive)
    }

    pub fn validate(&self, ndim: usize) -> AppResult<()> {
        if ndim == 0 {
            return Err(AppError::input("Sampler needs at least one dimension."));
        }
        if self.nlive <= ndim {
            return Err(AppError::input(format!(
                "nlive={} must exceed the number of dimensions ({ndim}).",
                self.nlive
            )));
        }
        if self.walks == 0 {
            return Err(AppError::input("walks must be >= 1."));
        }
        if !(self.enlarge.is_finite() && self.enlarge >= 1.0) {
            return Err(AppError::input(format!("enlarge must be >= 1, got {}.", self.enlarge)));
        }
        let dlogz = self.dlogz_threshold();
        if !(dlogz.is_finite() && dlogz > 0.0) {
            return Err(AppError::input(format!("dlogz must be > 0, got {dlogz}.")));
        }
        Ok(())
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Converged,
    MaxIter,
    MaxCall,
}

impl StopReason {
    pub fn label(self) -> &'static str {
        match self {
            StopReason::Converged => "converged",
            StopReason::MaxIter => "max_iter",
            StopReason::MaxCall => "max_call",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LivePoint {
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub logl: f64,
}

/// Dead points (in removal order) followed by the final live points.
#[derive(Debug, Clone)]
pub struct SamplerResults {
    pub nlive: usize,
    pub niter: usize,
    pub ncall: usize,
    /// Physical parameter vectors.
    pub samples: Vec<Vec<f64>>,
    /// Unit-cube coordinates.
    pub samples_u: Vec<Vec<f64>>,
    pub logl: Vec<f64>,
    pub logvol: Vec<f64>,
    pub logwt: Vec<f64>,
    /// Running `ln Z` after each sample.
    pub logz: Vec<f64>,
    pub logzerr: f64,
    pub information: f64,
    pub stop: StopReason,
}

impl SamplerResults {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn logz_final(&self) -> f64 {
        self.logz.last().copied().unwrap_or(f64::NEG_INFINITY)
    }

    /// Iterations per likelihood call, in percent.
    pub fn efficiency(&self) -> f64 {
        if self.ncall == 0 {
            return 0.0;
        }
        100.0 * self.niter as f64 / self.ncall as f64
    }

    /// Posterior importance weights `exp(logwt - ln Z)`.
    pub fn importance_weights(&self) -> Vec<f64> {
        let logz = self.logz_final();
        self.logwt.iter().map(|w| (w - logz).exp()).collect()
    }

    pub fn samples_matrix(&self) -> DMatrix<f64> {
        let ndim = self.samples.first().map(Vec::len).unwrap_or(0);
        DMatrix::from_fn(self.samples.len(), ndim, |i, j| self.samples[i][j])
    }
}

#[derive(Debug, Clone)]
pub struct NestedSampler {
    ndim: usize,
    options: SamplerOptions,
}

#[derive(Default)]
struct Accumulator {
    samples: Vec<Vec<f64>>,
    samples_u: Vec<Vec<f64>>,
    logl: Vec<f64>,
    logvol: Vec<f64>,
    logwt: Vec<f64>,
    logz: Vec<f64>,
    current_logz: f64,
    information: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            current_logz: f64::NEG_INFINITY,
            ..Self::default()
        }
    }

    fn push(&mut self, point: &LivePoint, logvol: f64, logwt: f64) {
        if logwt > f64::NEG_INFINITY {
            let logz_new = logaddexp(self.current_logz, logwt);
            let own = (logwt - logz_new).exp() * point.logl;
            self.information = if self.current_logz == f64::NEG_INFINITY {
                own - logz_new
            } else {
                own + (self.current_logz - logz_new).exp() * (self.information + self.current_logz)
                    - logz_new
            };
            self.current_logz = logz_new;
        }
        self.samples.push(point.v.clone());
        self.samples_u.push(point.u.clone());
        self.logl.push(point.logl);
        self.logvol.push(logvol);
        self.logwt.push(logwt);
        self.logz.push(self.current_logz);
    }
}

impl NestedSampler {
    pub fn new(ndim: usize, options: SamplerOptions) -> AppResult<Self> {
        options.validate(ndim)?;
        Ok(Self { ndim, options })
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Run to completion.
    ///
    /// `prior_transform` maps unit-cube coordinates to parameters; `loglike`
    /// scores parameters. Both are called from several threads during
    /// initialisation. A `NaN` likelihood aborts the run; `-inf` is allowed.
    pub fn run<P, L>(&self, prior_transform: P, loglike: L) -> AppResult<SamplerResults>
    where
        P: Fn(&[f64]) -> Vec<f64> + Sync,
        L: Fn(&[f64]) -> AppResult<f64> + Sync,
    {
        let opts = &self.options;
        let nlive = opts.nlive;
        let ndim = self.ndim;
        let dlogz = opts.dlogz_threshold();
        let update_every = opts.update_every();
        let first_update = opts.first_update_calls();
        let mut rng = StdRng::seed_from_u64(opts.seed);

        let loglike = |v: &[f64]| -> AppResult<f64> {
            let logl = loglike(v)?;
            if logl.is_nan() {
                return Err(AppError::numeric(format!("Log-likelihood is NaN at {v:?}.")));
            }
            Ok(logl)
        };

        let mut live = self.initial_live_points(&mut rng, &prior_transform, &loglike)?;
        if live.iter().all(|p| p.logl == f64::NEG_INFINITY) {
            return Err(AppError::numeric(
                "No initial live point has a finite log-likelihood.",
            ));
        }

        info!(nlive, ndim, dlogz, "nested sampling started");

        let mut acc = Accumulator::new();
        let mut ncall = nlive;
        let mut niter = 0usize;
        let mut logvol = 0.0_f64;
        // ln(1 - e^{-1/nlive}): log-width of each shell relative to the enclosing volume.
        let log_shrink = (-(-1.0 / nlive as f64).exp_m1()).ln();

        let mut bound: Option<Ellipsoid> = None;
        let mut bounded = false;
        let mut since_update = 0usize;
        let mut scale = 1.0_f64;

        let stop = loop {
            let (worst, loglstar) = worst_point(&live);
            let logl_max = live.iter().map(|p| p.logl).fold(f64::NEG_INFINITY, f64::max);
            let remaining = logaddexp(acc.current_logz, logl_max + logvol) - acc.current_logz;

            if remaining < dlogz {
                break StopReason::Converged;
            }
            if opts.max_iter.is_some_and(|m| niter >= m) {
                break StopReason::MaxIter;
            }
            if opts.max_call.is_some_and(|m| ncall >= m) {
                break StopReason::MaxCall;
            }

            let logvol_next = logvol - 1.0 / nlive as f64;
            acc.push(&live[worst], logvol_next, loglstar + logvol + log_shrink);
            logvol = logvol_next;
            niter += 1;

            if !bounded && ncall >= first_update {
                bounded = true;
            }

            let mut replacement = None;
            if !bounded {
                let (found, calls) =
                    sample_uniform(ndim, loglstar, &mut rng, &prior_transform, &loglike)?;
                ncall += calls;
                match found {
                    Some(p) => replacement = Some(p),
                    None => {
                        debug!(niter, "uniform sampling inefficient; switching to bounded walks");
                        bounded = true;
                    }
                }
            }

            let new_point = match replacement {
                Some(p) => p,
                None => {
                    if bound.is_none() || since_update >= update_every {
                        bound = Some(self.update_bound(&live, worst));
                        since_update = 0;
                    }
                    let axes = bound
                        .as_ref()
                        .map(|b| b.axes().clone())
                        .unwrap_or_else(|| Ellipsoid::unit_cube(ndim).axes().clone());

                    let start = &live[random_other(nlive, worst, &mut rng)];
                    let outcome = rwalk::random_walk(
                        start,
                        loglstar,
                        &axes,
                        scale,
                        opts.walks,
                        &mut rng,
                        &prior_transform,
                        &loglike,
                    )?;
                    ncall += outcome.ncall;
                    since_update += 1;
                    if outcome.accepted == 0 {
                        warn!(niter, scale, "random walk accepted no proposal; duplicating a live point");
                    }
                    scale = rwalk::adapt_scale(scale, outcome.accepted, outcome.rejected, ndim);
                    outcome.point
                }
            };
            live[worst] = new_point;

            if opts.log_every > 0 && niter % opts.log_every == 0 {
                debug!(
                    niter,
                    ncall,
                    logz = acc.current_logz,
                    dlogz = remaining,
                    loglstar,
                    "nested sampling progress"
                );
            }
        };

        // Remaining live points share the final volume equally.
        live.sort_by(|a, b| a.logl.total_cmp(&b.logl));
        let log_share = logvol - (nlive as f64).ln();
        for point in &live {
            acc.push(point, logvol, point.logl + log_share);
        }

        let information = acc.information;
        let logzerr = (information.max(0.0) / nlive as f64).sqrt();
        let results = SamplerResults {
            nlive,
            niter,
            ncall,
            samples: acc.samples,
            samples_u: acc.samples_u,
            logl: acc.logl,
            logvol: acc.logvol,
            logwt: acc.logwt,
            logz: acc.logz,
            logzerr,
            information,
            stop,
        };
        info!(
            niter,
            ncall,
            logz = results.logz_final(),
            logzerr,
            stop = stop.label(),
            "nested sampling finished"
        );
        Ok(results)
    }

    fn initial_live_points<P, L>(
        &self,
        rng: &mut StdRng,
        prior_transform: &P,
        loglike: &L,
    ) -> AppResult<Vec<LivePoint>>
    where
        P: Fn(&[f64]) -> Vec<f64> + Sync,
        L: Fn(&[f64]) -> AppResult<f64> + Sync,
    {
        // Draw sequentially so the run is reproducible for a given seed,
        // then evaluate in parallel.
        let units: Vec<Vec<f64>> = (0..self.options.nlive)
            .map(|_| (0..self.ndim).map(|_| rng.gen_range(0.0..1.0)).collect())
            .collect();
        units
            .into_par_iter()
            .map(|u| {
                let v = prior_transform(&u);
                let logl = loglike(&v)?;
                Ok(LivePoint { u, v, logl })
            })
            .collect()
    }

    fn update_bound(&self, live: &[LivePoint], exclude: usize) -> Ellipsoid {
        let points: Vec<&[f64]> = live
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != exclude)
            .map(|(_, p)| p.u.as_slice())
            .collect();
        Ellipsoid::bounding(&points, self.options.enlarge).unwrap_or_else(|| {
            debug!("bounding ellipsoid degenerate; falling back to the unit cube");
            Ellipsoid::unit_cube(self.ndim)
        })
    }
}

fn worst_point(live: &[LivePoint]) -> (usize, f64) {
    let mut worst = 0;
    for (i, p) in live.iter().enumerate().skip(1) {
        if p.logl < live[worst].logl {
            worst = i;
        }
    }
    (worst, live[worst].logl)
}

/// Uniform index in `0..n` different from `exclude` (`n >= 2`).
fn random_other(n: usize, exclude: usize, rng: &mut StdRng) -> usize {
    let i = rng.gen_range(0..n - 1);
    if i >= exclude { i + 1 } else { i }
}

fn sample_uniform<P, L>(
    ndim: usize,
    loglstar: f64,
    rng: &mut StdRng,
    prior_transform: &P,
    loglike: &L,
) -> AppResult<(Option<LivePoint>, usize)>
where
    P: Fn(&[f64]) -> Vec<f64>,
    L: Fn(&[f64]) -> AppResult<f64>,
{
    for calls in 1..=UNIFORM_TRIES {
        let u: Vec<f64> = (0..ndim).map(|_| rng.gen_range(0.0..1.0)).collect();
        let v = prior_transform(&u);
        let logl = loglike(&v)?;
        if logl > loglstar {
            return Ok((Some(LivePoint { u, v, logl }), calls));
        }
    }
    Ok((None, UNIFORM_TRIES))
}
