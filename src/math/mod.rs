//! Numerical utilities: emulator scaling and scalar statistics.

pub mod scaling;
pub mod stats;

pub use scaling::*;
pub use stats::*;
