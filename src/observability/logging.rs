//! Structured logging configuration.

use crate::config::{LogFormat, LoggingSettings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Log file (stderr when unset).
    pub file: Option<PathBuf>,
    /// Level filter.
    pub filter: EnvFilter,
}

impl LoggingConfig {
    /// Builds a logging configuration.
    ///
    /// `RUST_LOG` wins over the configured level; `verbose` raises the
    /// configured level to `debug`.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let level = if verbose {
            "debug"
        } else {
            settings.level.as_str()
        };
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        Self {
            format: settings.format,
            file: settings.file.clone(),
            filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_keeps_format_and_file() {
        let settings = LoggingSettings {
            level: "warn".to_string(),
            format: LogFormat::Json,
            file: Some(PathBuf::from("/tmp/tc.log")),
        };
        let config = LoggingConfig::from_settings(&settings, false);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.file, Some(PathBuf::from("/tmp/tc.log")));
    }

    #[test]
    fn test_invalid_level_falls_back() {
        let settings = LoggingSettings {
            level: "[[not a directive".to_string(),
            ..Default::default()
        };
        // Must not panic.
        let _ = LoggingConfig::from_settings(&settings, false);
    }
}
