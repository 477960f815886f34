//! Logging setup for applications embedding `SafeRoute`.
//!
//! Installs a global `tracing` subscriber:
//! - `RUST_LOG` takes precedence when set
//! - otherwise the configured level applies
//! - output is either multi-line pretty or one JSON object per line

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::SafeRouteError;
use crate::config::LoggingConfig;

/// Initialize the global subscriber from `config`.
///
/// # Errors
///
/// Returns an error if the level or format is invalid, or if a global
/// subscriber has already been installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };

    let (pretty, json) = match config.format.as_str() {
        "pretty" => (Some(tracing_subscriber::fmt::layer().pretty()), None),
        "json" => (None, Some(tracing_subscriber::fmt::layer().json())),
        other => {
            return Err(SafeRouteError::config(format!("Invalid log format '{other}'")).into());
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Parse a level or `EnvFilter` directive list
pub(crate) fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| SafeRouteError::config(format!("Invalid log level '{level}': {e}")).into())
}
