//! Logging setup for the portal.
//!
//! Installs a global `tracing` subscriber writing to stdout. The filter comes
//! from `RUST_LOG` and defaults to `info`.

use anyhow::{Context as _, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info";

pub fn init() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .context("failed to install tracing subscriber")?;

    tracing::debug!("logging initialized");
    Ok(())
}
