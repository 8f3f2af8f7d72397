//! Anthropic Messages API client.

use super::{DEFAULT_MAX_TOKENS, LlmHttpConfig, LlmProvider, build_http_client, execute, require_key};
use crate::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

/// Client for Claude models.
///
/// Requests are sent at temperature 0 so distillation is as repeatable as
/// the model allows.
pub struct AnthropicClient {
    api_key: Option<SecretString>,
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl AnthropicClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "claude-3-haiku-20240307";

    /// Creates a client, reading the key from `ANTHROPIC_API_KEY`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Sets the API base URL (without the `/messages` suffix).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the output token limit.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Rebuilds the HTTP client with new timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Returns true if an API key is set.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the key if it is present and shaped like an Anthropic key.
    fn validate(&self) -> Result<&str> {
        let key = require_key(PROVIDER, self.api_key.as_ref(), "ANTHROPIC_API_KEY")?;
        if looks_like_anthropic_key(key) {
            Ok(key)
        } else {
            Err(Error::OperationFailed {
                operation: format!("{PROVIDER}_request"),
                cause: "Invalid API key format: expected 'sk-ant-' prefix".to_string(),
            })
        }
    }

    fn messages(&self, system: Option<&str>, user: &str) -> Result<String> {
        let key = self.validate()?;
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system,
            messages: [UserMessage {
                role: "user",
                content: user,
            }],
        };
        let request = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let reply: MessagesResponse = execute(PROVIDER, &self.model, request)?;
        reply.first_text().ok_or_else(|| Error::OperationFailed {
            operation: format!("{PROVIDER}_response"),
            cause: "No text content in response".to_string(),
        })
    }
}

/// Keys are `sk-ant-` followed by URL-safe characters, 40 bytes or more.
fn looks_like_anthropic_key(key: &str) -> bool {
    key.len() >= 40
        && key.starts_with("sk-ant-")
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.messages(None, prompt)
    }

    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        self.messages(Some(system), user)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

impl MessagesResponse {
    fn first_text(self) -> Option<String> {
        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_KEY: &str = "sk-ant-REDACTED";

    fn keyless() -> AnthropicClient {
        AnthropicClient {
            api_key: None,
            endpoint: AnthropicClient::DEFAULT_ENDPOINT.to_string(),
            model: AnthropicClient::DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: reqwest::blocking::Client::new(),
        }
    }

    #[test]
    fn test_builder_sets_fields() {
        let client = keyless()
            .with_api_key(VALID_KEY)
            .with_endpoint("http://localhost:9999/v1/")
            .with_model("claude-3-opus-20240229")
            .with_max_tokens(256);

        assert_eq!(client.name(), "anthropic");
        assert!(client.has_api_key());
        assert_eq!(client.endpoint, "http://localhost:9999/v1");
        assert_eq!(client.model, "claude-3-opus-20240229");
        assert_eq!(client.max_tokens, 256);
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let client = keyless();
        assert!(!client.has_api_key());
        let err = client.complete_with_system("sys", "user").unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY not set"));
    }

    #[test]
    fn test_key_shape() {
        assert!(looks_like_anthropic_key(VALID_KEY));
        assert!(looks_like_anthropic_key("sk-ant-REDACTED"));
        assert!(!looks_like_anthropic_key(""));
        assert!(!looks_like_anthropic_key("sk-ant-"));
        assert!(!looks_like_anthropic_key("sk-other-api03-ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789"));
        assert!(!looks_like_anthropic_key("sk-ant-REDACTED!@#$"));
    }

    #[test]
    fn test_request_body_omits_absent_system_prompt() {
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            temperature: 0.0,
            system: None,
            messages: [UserMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_first_text_skips_other_blocks() {
        let reply: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "thinking"}, {"type": "text", "text": "answer"}]}"#,
        )
        .unwrap();
        assert_eq!(reply.first_text().as_deref(), Some("answer"));

        let empty: MessagesResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.first_text().is_none());
    }
}
