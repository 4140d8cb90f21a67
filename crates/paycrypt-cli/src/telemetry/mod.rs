//! Telemetry initialisation for the CLI.
//!
//! Structured JSON logs go to stderr so that stdout carries only the
//! operation result. No key material, plaintext, or MAC is ever logged.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install the global JSON subscriber.
///
/// A valid `RUST_LOG` wins over `log_level`; otherwise `log_level` must parse
/// as a filter directive.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid directive or a subscriber
/// is already installed.
pub fn init(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => level_filter(log_level)?,
    };

    tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing subscriber already installed: {e}"))
}

fn level_filter(log_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(log_level)
        .with_context(|| format!("PAYCRYPT_LOG_LEVEL `{log_level}` is not a valid filter"))
}
