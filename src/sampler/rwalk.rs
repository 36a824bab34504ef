//! Constrained random walk in the unit cube.
//!
//! Starting from a surviving live point, take `walks` steps; each step draws
//! a point uniformly from the unit ball, maps it through the ellipsoid axes
//! and the current scale, and is accepted when it stays inside the cube and
//! beats the likelihood threshold.

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::error::AppResult;
use crate::sampler::LivePoint;

/// Out-of-cube proposals tolerated per requested step before giving up.
const MAX_FAILS_PER_WALK: usize = 100;
/// Likelihood calls tolerated per requested step while nothing has been accepted.
const MAX_CALLS_PER_WALK: usize = 50;

#[derive(Debug, Clone)]
pub(crate) struct WalkOutcome {
    pub point: LivePoint,
    pub accepted: usize,
    pub rejected: usize,
    pub ncall: usize,
}

pub(crate) fn random_walk<P, L>(
    start: &LivePoint,
    loglstar: f64,
    axes: &DMatrix<f64>,
    scale: f64,
    walks: usize,
    rng: &mut StdRng,
    prior_transform: &P,
    loglike: &L,
) -> AppResult<WalkOutcome>
where
    P: Fn(&[f64]) -> Vec<f64>,
    L: Fn(&[f64]) -> AppResult<f64>,
{
    let ndim = start.u.len();
    let mut current = start.clone();
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    let mut ncall = 0usize;
    let mut nfail = 0usize;

    while ncall < walks || accepted == 0 {
        if ncall >= walks * MAX_CALLS_PER_WALK || nfail >= walks * MAX_FAILS_PER_WALK {
            break;
        }

        let step = axes * unit_ball(ndim, rng) * scale;
        let u: Vec<f64> = current.u.iter().zip(step.iter()).map(|(a, b)| a + b).collect();
        if u.iter().any(|x| !(0.0..=1.0).contains(x)) {
            nfail += 1;
            continue;
        }

        let v = prior_transform(&u);
        let logl = loglike(&v)?;
        ncall += 1;
        if logl > loglstar {
            current = LivePoint { u, v, logl };
            accepted += 1;
        } else {
            rejected += 1;
        }
    }

    Ok(WalkOutcome {
        point: current,
        accepted,
        rejected,
        ncall,
    })
}

/// Uniform draw from the unit `ndim`-ball.
fn unit_ball(ndim: usize, rng: &mut StdRng) -> DVector<f64> {
    let z = DVector::from_fn(ndim, |_, _| rng.sample::<f64, _>(StandardNormal));
    let norm = z.norm().max(f64::MIN_POSITIVE);
    let radius = rng.gen_range(0.0_f64..1.0).powf(1.0 / ndim as f64);
    z * (radius / norm)
}

/// Multiplicative scale update steering the acceptance fraction towards one half.
pub(crate) fn adapt_scale(scale: f64, accepted: usize, rejected: usize, ndim: usize) -> f64 {
    const TARGET: f64 = 0.5;
    let total = accepted + rejected;
    if total == 0 {
        return scale;
    }
    let facc = accepted as f64 / total as f64;
    let norm = TARGET.max(1.0 - TARGET) * ndim as f64;
    (scale * ((facc - TARGET) / norm).exp()).min((ndim as f64).sqrt())
}
