//! Process-wide startup configuration.
//!
//! Thread count and log verbosity are resolved here once, from the
//! environment and an optional `.env` file, and installed by the binary
//! before any work runs. Execution is CPU-only; the only compute knob is the
//! rayon pool size.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{AppError, AppResult};

/// Number of worker threads for batch prediction and live-point initialisation.
pub const THREADS_VAR: &str = "PITCHFORK_THREADS";
/// Log filter used when `RUST_LOG` is not set (e.g. `info`, `pitchfork=debug`).
pub const LOG_VAR: &str = "PITCHFORK_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// `None` lets rayon size the pool from the available cores.
    pub threads: Option<usize>,
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            threads: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Read the configuration from the process environment (after loading `.env`).
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let threads = match lookup(THREADS_VAR) {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => {
                let n: usize = raw.trim().parse().map_err(|_| {
                    AppError::input(format!("{THREADS_VAR} must be a positive integer, got '{raw}'."))
                })?;
                if n == 0 {
                    return Err(AppError::input(format!("{THREADS_VAR} must be >= 1.")));
                }
                Some(n)
            }
        };

        let log_filter = lookup(LOG_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self { threads, log_filter })
    }

    /// Install the tracing subscriber and size the global rayon pool.
    ///
    /// An already installed subscriber is left in place. The pool can only be
    /// sized once per process.
    pub fn install(&self) -> AppResult<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.log_filter))
            .map_err(|e| AppError::input(format!("Invalid log filter '{}': {e}", self.log_filter)))?;

        // A subscriber may already be installed (tests, embedding applications).
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();

        if let Some(threads) = self.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .map_err(|e| AppError::input(format!("Failed to configure thread pool: {e}")))?;
        }

        tracing::debug!(threads = ?self.threads, "runtime configured (cpu only)");
        Ok(())
    }
}
