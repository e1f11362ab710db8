//! Logging system for ks.
//!
//! Installs a `tracing` subscriber whose filter comes from `RUST_LOG` when
//! set, and from the requested level otherwise.

use ks_types::{KsError, LogLevel, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
    /// JSON format for machine parsing
    Json,
}

/// Logging settings assembled from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// Level for ks crates
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
        }
    }
}

impl LogSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub fn directive(&self) -> String {
        format!(
            "ks={level},ks_app={level},ks_params={level},ks_manifest={level},ks_schema={level},ks_jsonnet={level},ks_core={level},warn",
            level = self.level
        )
    }
}

/// Initialize the logging system with default configuration.
pub fn init_default() -> Result<()> {
    init(&LogSettings::default())
}

/// Initialize logging. Logs go to stderr so rendered objects on stdout stay clean.
pub fn init(settings: &LogSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.directive()));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match settings.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| KsError::Config(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_uses_level() {
        let settings = LogSettings {
            level: LogLevel::Debug,
            format: LogFormat::Compact,
        };
        assert!(settings.directive().starts_with("ks=debug"));
    }
}
