//! Structured logging and Prometheus metrics.
//!
//! Logs go to stderr or a file, never stdout: the MCP server owns stdout.

mod logging;
mod metrics;

pub use logging::LoggingConfig;
pub use metrics::install_prometheus;

use crate::config::{LogFormat, TraceContextConfig};
use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

type FmtLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Installs the global subscriber and, if configured, the metrics exporter.
///
/// Returns the metrics listen address when one was started. A second call
/// fails because the global subscriber is already set.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed, the log file
/// cannot be opened, or the exporter fails to start.
pub fn init(config: &TraceContextConfig, verbose: bool) -> Result<Option<SocketAddr>> {
    let logging = LoggingConfig::from_settings(&config.logging, verbose);

    let (writer, ansi) = match &logging.file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(std::io::stderr), true),
    };

    tracing_subscriber::registry()
        .with(fmt_layer(logging.format, writer, ansi))
        .with(logging.filter)
        .try_init()
        .map_err(|e| Error::OperationFailed {
            operation: "observability_init".to_string(),
            cause: e.to_string(),
        })?;

    install_prometheus(&config.metrics)
}

fn fmt_layer(format: LogFormat, writer: BoxMakeWriter, ansi: bool) -> FmtLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true);
    match format {
        LogFormat::Json => base.json().with_current_span(true).with_span_list(true).boxed(),
        LogFormat::Pretty => base.pretty().with_ansi(ansi).with_thread_names(true).boxed(),
        LogFormat::Compact => base.compact().with_ansi(ansi).boxed(),
    }
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    let failed = |operation: &str, e: std::io::Error| Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!("{}: {e}", path.display()),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| failed("create_log_dir", e))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| failed("open_log_file", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_file_is_appended_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tc.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_log_file_under_a_regular_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let err = open_log_file(&blocker.join("tc.log")).unwrap_err();
        assert!(err.to_string().contains("create_log_dir"));
    }
}
