//! Bayesian inversion of a forward model.
//!
//! - `prior`: prior distributions and their percent-point functions
//! - `likelihood`: observations and the Gaussian log-likelihood
//! - `forward`: the trait a forward model implements
//! - `inversion`: the orchestrator feeding both into the nested sampler

pub mod forward;
pub mod inversion;
pub mod likelihood;
pub mod prior;

pub use forward::Forward;
pub use inversion::{DEFAULT_NLIVE, Inversion};
pub use likelihood::{DEFAULT_LOGL_SCALE, Observation, Observations};
pub use prior::{Prior, PriorSpec};
