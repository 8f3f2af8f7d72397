//! LLM client abstraction.
//!
//! The agents only see [`LlmProvider`]. The two hosted clients differ in
//! request shape and authentication; transport, status handling, decoding
//! and metrics are shared.

mod anthropic;
mod openai;
pub mod prompts;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};

/// Default output token limit per request.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Maximum bytes of an error body or unparseable reply quoted in an error.
const MAX_QUOTED_BYTES: usize = 500;

/// A text-completion provider.
pub trait LlmProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Generates a completion with a system prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    ///
    /// The default folds the system prompt into the user prompt; hosted
    /// clients send it natively.
    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        let combined = format!("{system}\n\n---\n\nUser message:\n{user}");
        self.complete(&combined)
    }
}

/// HTTP timeouts for provider requests.
#[derive(Debug, Clone, Copy)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Applies the `[llm]` timeout overrides to the defaults.
    #[must_use]
    pub fn from_config(config: &crate::config::LlmConfig) -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: config.timeout_ms.unwrap_or(defaults.timeout_ms),
            connect_timeout_ms: config
                .connect_timeout_ms
                .unwrap_or(defaults.connect_timeout_ms),
        }
    }
}

/// Builds a blocking HTTP client with the given timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let millis = |ms: u64| (ms > 0).then_some(Duration::from_millis(ms));
    let mut builder = reqwest::blocking::Client::builder();
    if let Some(timeout) = millis(config.timeout_ms) {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = millis(config.connect_timeout_ms) {
        builder = builder.connect_timeout(timeout);
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "Falling back to a default LLM HTTP client");
        reqwest::blocking::Client::new()
    })
}

/// Returns the API key, failing before any network traffic if it is unset.
pub(crate) fn require_key<'a>(
    provider: &str,
    key: Option<&'a SecretString>,
    env_var: &str,
) -> Result<&'a str> {
    key.map(|k| k.expose_secret())
        .ok_or_else(|| Error::OperationFailed {
            operation: format!("{provider}_request"),
            cause: format!("{env_var} not set"),
        })
}

/// Sends a provider request and decodes its JSON reply.
///
/// Transport errors and non-2xx statuses fail as `<provider>_request`,
/// undecodable bodies as `<provider>_response`. Every call is counted in
/// `tracecontext_llm_requests_total` and timed.
pub(crate) fn execute<T: DeserializeOwned>(
    provider: &'static str,
    model: &str,
    request: reqwest::blocking::RequestBuilder,
) -> Result<T> {
    let start = Instant::now();
    tracing::debug!(provider, model, "Sending LLM request");

    let result = send_and_decode(provider, request);

    let status = if result.is_ok() { "success" } else { "error" };
    metrics::counter!("tracecontext_llm_requests_total", "provider" => provider, "status" => status)
        .increment(1);
    metrics::histogram!("tracecontext_llm_request_duration_ms", "provider" => provider)
        .record(start.elapsed().as_secs_f64() * 1000.0);
    if let Err(e) = &result {
        tracing::warn!(provider, model, error = %e, "LLM request failed");
    }
    result
}

fn send_and_decode<T: DeserializeOwned>(
    provider: &str,
    request: reqwest::blocking::RequestBuilder,
) -> Result<T> {
    let response = request.send().map_err(|e| Error::OperationFailed {
        operation: format!("{provider}_request"),
        cause: format!("{} error: {e}", error_kind(&e)),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::OperationFailed {
            operation: format!("{provider}_request"),
            cause: format!(
                "API returned status: {status} - {}",
                prompts::truncate_on_char_boundary(&body, MAX_QUOTED_BYTES)
            ),
        });
    }

    response.json().map_err(|e| Error::OperationFailed {
        operation: format!("{provider}_response"),
        cause: e.to_string(),
    })
}

/// Classifies a reqwest error for logs and error messages.
fn error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else if e.is_decode() {
        "decode"
    } else {
        "unknown"
    }
}

/// Parses a structured reply from model output.
///
/// Accepts bare JSON, JSON inside a markdown fence, and JSON surrounded by
/// prose.
///
/// # Errors
///
/// Returns an error tagged with `operation` if no JSON matching `T` can be
/// extracted.
pub fn parse_json_response<T: DeserializeOwned>(operation: &str, response: &str) -> Result<T> {
    serde_json::from_str(extract_json(response)).map_err(|e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: format!(
            "Invalid JSON: {e}. Response: {}",
            prompts::truncate_on_char_boundary(response, MAX_QUOTED_BYTES)
        ),
    })
}

/// Narrows a reply to its first fenced block (if any), then to the
/// outermost `{...}` span.
fn extract_json(response: &str) -> &str {
    let text = fenced_block(response).unwrap_or(response).trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Body of the first closed ```` ``` ```` fence, language tag included.
fn fenced_block(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once("```")?;
    let (body, _) = rest.split_once("```")?;
    Some(body)
}
