//! Prior distributions and their inverse CDFs.
//!
//! The sampler works in the unit hypercube; each coordinate is mapped to
//! physical space through the matching prior's percent-point function.
//!
//! [`PriorSpec`] is the serialisable description (run files, CLI), [`Prior`]
//! is the validated, ready-to-evaluate form.

use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF, Gamma, LogNormal, Normal};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorSpec {
    Uniform {
        low: f64,
        high: f64,
    },
    /// Uniform in `ln(x)` on `[low, high]`.
    LogUniform {
        low: f64,
        high: f64,
    },
    Normal {
        mean: f64,
        std_dev: f64,
    },
    /// Normal restricted to `[low, high]`.
    TruncatedNormal {
        mean: f64,
        std_dev: f64,
        low: f64,
        high: f64,
    },
    LogNormal {
        location: f64,
        scale: f64,
    },
    /// Beta(alpha, beta) stretched onto `[low, high]`.
    Beta {
        alpha: f64,
        beta: f64,
        #[serde(default)]
        low: f64,
        #[serde(default = "one")]
        high: f64,
    },
    Gamma {
        shape: f64,
        rate: f64,
    },
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone)]
pub struct Prior {
    spec: PriorSpec,
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    Uniform { low: f64, width: f64 },
    LogUniform { ln_low: f64, ln_width: f64 },
    Normal(Normal),
    TruncatedNormal { dist: Normal, cdf_low: f64, cdf_span: f64 },
    LogNormal(LogNormal),
    Beta { dist: Beta, low: f64, width: f64 },
    Gamma(Gamma),
}

impl Prior {
    pub fn new(spec: PriorSpec) -> AppResult<Self> {
        let kind = match spec {
            PriorSpec::Uniform { low, high } => {
                check_interval(low, high, "uniform")?;
                Kind::Uniform {
                    low,
                    width: high - low,
                }
            }
            PriorSpec::LogUniform { low, high } => {
                check_interval(low, high, "log-uniform")?;
                if low <= 0.0 {
                    return Err(AppError::input(format!(
                        "Log-uniform prior needs low > 0, got {low}."
                    )));
                }
                Kind::LogUniform {
                    ln_low: low.ln(),
                    ln_width: high.ln() - low.ln(),
                }
            }
            PriorSpec::Normal { mean, std_dev } => Kind::Normal(normal(mean, std_dev)?),
            PriorSpec::TruncatedNormal {
                mean,
                std_dev,
                low,
                high,
            } => {
                check_interval(low, high, "truncated normal")?;
                let dist = normal(mean, std_dev)?;
                let cdf_low = dist.cdf(low);
                let cdf_span = dist.cdf(high) - cdf_low;
                if !(cdf_span > 0.0) {
                    return Err(AppError::input(format!(
                        "Truncated normal N({mean}, {std_dev}) has no mass on [{low}, {high}]."
                    )));
                }
                Kind::TruncatedNormal {
                    dist,
                    cdf_low,
                    cdf_span,
                }
            }
            PriorSpec::LogNormal { location, scale } => Kind::LogNormal(
                LogNormal::new(location, scale)
                    .map_err(|e| AppError::input(format!("Invalid log-normal prior: {e}")))?,
            ),
            PriorSpec::Beta {
                alpha,
                beta,
                low,
                high,
            } => {
                check_interval(low, high, "beta")?;
                Kind::Beta {
                    dist: Beta::new(alpha, beta)
                        .map_err(|e| AppError::input(format!("Invalid beta prior: {e}")))?,
                    low,
                    width: high - low,
                }
            }
            PriorSpec::Gamma { shape, rate } => Kind::Gamma(
                Gamma::new(shape, rate)
                    .map_err(|e| AppError::input(format!("Invalid gamma prior: {e}")))?,
            ),
        };
        Ok(Self { spec, kind })
    }

    pub fn uniform(low: f64, high: f64) -> AppResult<Self> {
        Self::new(PriorSpec::Uniform { low, high })
    }

    pub fn normal(mean: f64, std_dev: f64) -> AppResult<Self> {
        Self::new(PriorSpec::Normal { mean, std_dev })
    }

    pub fn spec(&self) -> PriorSpec {
        self.spec
    }

    /// Percent-point function (inverse CDF). `u` is clamped to `[0, 1]`.
    pub fn ppf(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match &self.kind {
            Kind::Uniform { low, width } => low + u * width,
            Kind::LogUniform { ln_low, ln_width } => (ln_low + u * ln_width).exp(),
            Kind::Normal(dist) => dist.inverse_cdf(u),
            Kind::TruncatedNormal {
                dist,
                cdf_low,
                cdf_span,
            } => dist.inverse_cdf(cdf_low + u * cdf_span),
            Kind::LogNormal(dist) => dist.inverse_cdf(u),
            Kind::Beta { dist, low, width } => low + width * dist.inverse_cdf(u),
            Kind::Gamma(dist) => dist.inverse_cdf(u),
        }
    }

    pub fn median(&self) -> f64 {
        self.ppf(0.5)
    }
}

fn normal(mean: f64, std_dev: f64) -> AppResult<Normal> {
    Normal::new(mean, std_dev).map_err(|e| AppError::input(format!("Invalid normal prior: {e}")))
}

fn check_interval(low: f64, high: f64, what: &str) -> AppResult<()> {
    if !(low.is_finite() && high.is_finite() && high > low) {
        return Err(AppError::input(format!(
            "Invalid {what} prior bounds [{low}, {high}] (must be finite with high > low)."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_maps_the_unit_interval() {
        let p = Prior::uniform(2.0, 6.0).unwrap();
        assert_eq!(p.ppf(0.0), 2.0);
        assert_eq!(p.ppf(0.25), 3.0);
        assert_eq!(p.ppf(1.0), 6.0);
        assert_eq!(p.median(), 4.0);
    }

    #[test]
    fn medians_are_at_one_half() {
        let cases = [
            (PriorSpec::Normal { mean: 1.5, std_dev: 0.2 }, 1.5),
            (PriorSpec::LogUniform { low: 1.0, high: 100.0 }, 10.0),
            (
                PriorSpec::TruncatedNormal { mean: 0.0, std_dev: 1.0, low: -1.0, high: 1.0 },
                0.0,
            ),
            (PriorSpec::LogNormal { location: 0.0, scale: 0.5 }, 1.0),
            (PriorSpec::Beta { alpha: 2.0, beta: 2.0, low: 0.0, high: 10.0 }, 5.0),
        ];
        for (spec, median) in cases {
            let p = Prior::new(spec).unwrap();
            assert!((p.median() - median).abs() < 1e-3, "{spec:?}: {}", p.median());
        }
    }

    #[test]
    fn truncated_normal_stays_inside_bounds() {
        let p = Prior::new(PriorSpec::TruncatedNormal {
            mean: 0.0,
            std_dev: 1.0,
            low: 0.5,
            high: 2.0,
        })
        .unwrap();
        for u in [0.001, 0.1, 0.5, 0.9, 0.999] {
            let x = p.ppf(u);
            assert!((0.5..=2.0).contains(&x), "u={u} -> {x}");
        }
    }

    #[test]
    fn gamma_ppf_inverts_the_cdf() {
        let p = Prior::new(PriorSpec::Gamma { shape: 2.0, rate: 1.0 }).unwrap();
        let x = p.ppf(0.3);
        let dist = Gamma::new(2.0, 1.0).unwrap();
        assert!((dist.cdf(x) - 0.3).abs() < 1e-3);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(Prior::uniform(1.0, 1.0).is_err());
        assert!(Prior::normal(0.0, -1.0).is_err());
        assert!(Prior::new(PriorSpec::LogUniform { low: 0.0, high: 1.0 }).is_err());
        assert!(Prior::new(PriorSpec::TruncatedNormal { mean: 0.0, std_dev: 1e-3, low: 50.0, high: 60.0 }).is_err());
    }

    #[test]
    fn parses_tagged_specs() {
        let spec: PriorSpec = serde_json::from_str(r#"{"kind": "uniform", "low": 0.7, "high": 1.3}"#).unwrap();
        assert_eq!(spec, PriorSpec::Uniform { low: 0.7, high: 1.3 });
        let spec: PriorSpec = serde_json::from_str(r#"{"kind": "beta", "alpha": 2, "beta": 5}"#).unwrap();
        assert_eq!(spec, PriorSpec::Beta { alpha: 2.0, beta: 5.0, low: 0.0, high: 1.0 });
    }
}
