//! # aerochart-runner
//!
//! Library side of the `aerochart` command: configuration loading, logging
//! setup and the command implementations.

pub mod commands;
mod config;
mod error;

pub use config::Config;
pub use error::RunnerError;

use tracing_subscriber::EnvFilter;

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over
/// `default_level`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // a subscriber may already be installed, e.g. by a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
