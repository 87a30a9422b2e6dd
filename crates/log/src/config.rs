//! Logging configuration: output format and filter directive.

use serde::{Deserialize, Serialize};

/// Wire format for emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Human-readable, ANSI-coloured when the terminal supports it.
    Pretty,
    /// One JSON object per line, for ingestion by a log aggregator.
    Json,
}

/// Logging configuration, typically loaded alongside the rest of the
/// host process's assembled config (env vars layered over a config file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info,nebula_engine=debug"`.
    pub filter: String,
    /// Output format.
    pub format: Format,
    /// Whether to include source file and line number in each event.
    pub with_location: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: Format::Pretty,
            with_location: false,
        }
    }
}

impl Config {
    /// Read `RUST_LOG` into `filter`, falling back to `"info"` when unset.
    #[must_use]
    pub fn from_env() -> Self {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Preset for local development: pretty output, `debug` default level.
    #[must_use]
    pub fn development() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()),
            format: Format::Pretty,
            with_location: true,
        }
    }

    /// Preset for production: JSON output, `info` default level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            format: Format::Json,
            with_location: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info() {
        assert_eq!(Config::default().filter, "info");
        assert_eq!(Config::default().format, Format::Pretty);
    }

    #[test]
    fn production_preset_uses_json() {
        assert_eq!(Config::production().format, Format::Json);
    }
}
