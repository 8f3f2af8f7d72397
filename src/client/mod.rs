//! HTTP client for a running orchestrator.
//!
//! Used by the CLI (`status`, `search`, `reset`), the git hook, and the MCP
//! server. The `OrchestratorApi` trait lets the MCP layer run against a fake
//! orchestrator in tests.

use crate::config::ClientConfig;
use crate::models::Event;
use crate::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    /// Liveness banner.
    pub status: String,
    /// Orchestrator version.
    #[serde(default)]
    pub version: String,
}

/// Body of `POST /events`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventAck {
    /// Always `received`.
    pub status: String,
    /// Identifier of the stored record.
    pub event_id: String,
    /// Canonical event kind.
    #[serde(default)]
    pub kind: String,
    /// True if the stored record is a placeholder.
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Debug, Deserialize)]
struct ContextBody {
    #[serde(default)]
    context: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResetBody {
    #[serde(default)]
    cleared: usize,
}

/// Operations a client can perform against the orchestrator.
///
/// Implementations return [`Error::Unavailable`] when the orchestrator
/// cannot be reached, so callers can print an "offline" hint instead of a
/// failure.
pub trait OrchestratorApi: Send + Sync {
    /// Fetches the liveness banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn health(&self) -> Result<HealthStatus>;

    /// Posts an event for ingestion.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn post_event(&self, event: &Event) -> Result<EventAck>;

    /// Searches the context store; `None` lists everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn context(&self, query: Option<&str>) -> Result<Vec<String>>;

    /// Clears the context store, returning the number of removed records.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn reset(&self) -> Result<usize>;
}

/// Blocking HTTP implementation of [`OrchestratorApi`].
pub struct OrchestratorClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OrchestratorClient {
    /// Creates a client for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("tracecontext/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Creates a client from configuration.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.orchestrator_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<T> {
        let response = request
            .send()
            .map_err(|e| self.transport_error(operation, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: operation.to_string(),
                cause: format!("HTTP {}: {body}", status.as_u16()),
            });
        }

        response.json::<T>().map_err(|e| Error::OperationFailed {
            operation: operation.to_string(),
            cause: format!("invalid response body: {e}"),
        })
    }

    fn transport_error(&self, operation: &str, err: &reqwest::Error) -> Error {
        if err.is_connect() || err.is_timeout() {
            tracing::debug!(operation, url = %self.base_url, error = %err, "Orchestrator unreachable");
            Error::Unavailable(format!("orchestrator at {}: {err}", self.base_url))
        } else {
            Error::OperationFailed {
                operation: operation.to_string(),
                cause: err.to_string(),
            }
        }
    }
}

impl OrchestratorApi for OrchestratorClient {
    fn health(&self) -> Result<HealthStatus> {
        self.execute("orchestrator_health", self.client.get(self.url("/")))
    }

    fn post_event(&self, event: &Event) -> Result<EventAck> {
        self.execute(
            "orchestrator_post_event",
            self.client.post(self.url("/events")).json(event),
        )
    }

    fn context(&self, query: Option<&str>) -> Result<Vec<String>> {
        let mut request = self.client.get(self.url("/context"));
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            request = request.query(&[("query", q)]);
        }
        let body: ContextBody = self.execute("orchestrator_context", request)?;
        Ok(body.context)
    }

    fn reset(&self) -> Result<usize> {
        let body: ResetBody =
            self.execute("orchestrator_reset", self.client.post(self.url("/reset")))?;
        Ok(body.cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = OrchestratorClient::new("http://localhost:8000/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/context"), "http://localhost:8000/context");
    }

    #[test]
    fn test_unreachable_is_unavailable() {
        // Port 9 (discard) on localhost is closed on test machines.
        let client = OrchestratorClient::new("http://127.0.0.1:9", Duration::from_millis(500));
        let Err(err) = client.health() else {
            panic!("expected an error");
        };
        assert!(matches!(err, Error::Unavailable(_)), "got {err}");
    }

    #[test]
    fn test_ack_defaults() {
        let ack: EventAck =
            serde_json::from_str(r#"{"status":"received","event_id":"abc"}"#).unwrap();
        assert_eq!(ack.event_id, "abc");
        assert!(!ack.degraded);
    }
}
