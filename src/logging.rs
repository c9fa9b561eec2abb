//! Logging setup for the command-line tool.
//!
//! Human-readable lines go to stderr so that `report` and `summary` output on
//! stdout stays clean. `RUST_LOG` takes precedence over the verbosity flag.
//!
//! ```no_run
//! coffee_happiness::logging::init(1).expect("logging");
//! tracing::info!("started");
//! ```

use anyhow::{Context as _, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

/// Default filter for a `-v` count: 0 → warn, 1 → info, 2 → debug, 3+ → trace.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))
        .context("Failed to build log filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    tracing::debug!(verbosity, "logging initialized");
    Ok(())
}
