//! Subscriber setup for binaries and test harnesses embedding the engine.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set, otherwise `log_level` is used as the filter.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!(e).context("Failed to install tracing subscriber"))
}
