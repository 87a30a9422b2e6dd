//! Global subscriber installation.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, Format};
use crate::error::LogError;

/// Build the `EnvFilter` for `config.filter`, reporting a malformed
/// directive rather than silently falling back.
fn build_filter(config: &Config) -> Result<EnvFilter, LogError> {
    EnvFilter::try_new(&config.filter).map_err(|source| LogError::InvalidFilter {
        directive: config.filter.clone(),
        source,
    })
}

/// Install the global `tracing` subscriber described by `config`.
///
/// Call once, near the top of `main`. Returns [`LogError::AlreadyInitialized`]
/// if a global subscriber is already set (e.g. called twice, or from a test
/// binary that also installs one).
pub fn init(config: &Config) -> Result<(), LogError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        Format::Pretty => registry
            .with(fmt::layer().with_ansi(true).with_file(config.with_location))
            .try_init(),
        Format::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_file(config.with_location),
            )
            .try_init(),
    };

    result.map_err(|_| LogError::AlreadyInitialized)
}
