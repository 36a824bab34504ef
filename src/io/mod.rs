//! Input/output helpers.
//!
//! - run files for `infer` (`config`)
//! - numeric CSV tables (`table`)
//! - posterior and summary exports (`export`)

pub mod config;
pub mod export;
pub mod table;

pub use config::*;
pub use export::*;
pub use table::*;
