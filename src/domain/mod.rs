//! Domain types shared by the CLI front-end and the pipeline.
//!
//! This module defines:
//!
//! - CLI-facing enums (`PolicyKind`)
//! - per-command run configurations (`PredictConfig`, `InferConfig`, `ValidateConfig`)
//! - the serialisable run summary written by `infer --export-summary`

pub mod types;

pub use types::*;
