//! Prometheus exporter.
//!
//! `metrics::counter!` and friends are no-ops until a recorder is installed.

use crate::config::MetricsSettings;
use crate::{Error, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Installs the global Prometheus recorder and its scrape listener.
///
/// Returns the listen address, or `None` when `expose` is off. Without an
/// ambient Tokio runtime the exporter runs on its own background thread.
///
/// # Errors
///
/// Returns an error if the listener cannot be built or a global recorder is
/// already installed.
pub fn install_prometheus(settings: &MetricsSettings) -> Result<Option<SocketAddr>> {
    if !settings.expose {
        return Ok(None);
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_install".to_string(),
            cause: e.to_string(),
        })?;

    tracing::info!(%addr, "Prometheus metrics endpoint listening");
    Ok(Some(addr))
}
