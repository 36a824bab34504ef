//! `pitchfork` library crate.
//!
//! A neural-network emulator of stellar models and a nested-sampling
//! inversion that estimates stellar parameters from observations.
//!
//! The binary (`pitchfork`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the emulator and the sampler are reusable on their own

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod emulator;
pub mod error;
pub mod inference;
pub mod io;
pub mod math;
pub mod nn;
pub mod plot;
pub mod report;
pub mod sampler;
