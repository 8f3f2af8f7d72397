//! `OpenAI` Chat Completions client.

use super::{DEFAULT_MAX_TOKENS, LlmHttpConfig, LlmProvider, build_http_client, execute, require_key};
use crate::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "openai";

/// Model-name prefixes that take `max_completion_tokens` and reject a
/// non-default temperature.
const REASONING_PREFIXES: [&str; 3] = ["gpt-5", "o1", "o3"];

/// Client for `OpenAI` chat models.
pub struct OpenAiClient {
    api_key: Option<SecretString>,
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    /// Creates a client, reading the key from `OPENAI_API_KEY`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY")
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

    /// Sets the API base URL (without the `/chat/completions` suffix).
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

    fn validate(&self) -> Result<&str> {
        require_key(PROVIDER, self.api_key.as_ref(), "OPENAI_API_KEY")
    }

    fn is_reasoning_model(&self) -> bool {
        REASONING_PREFIXES
            .iter()
            .any(|prefix| self.model.starts_with(prefix))
    }

    fn build_request<'a>(&'a self, messages: Vec<ChatMessage<'a>>) -> ChatCompletionRequest<'a> {
        let reasoning = self.is_reasoning_model();
        ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: (!reasoning).then_some(self.max_tokens),
            max_completion_tokens: reasoning.then_some(self.max_tokens),
            temperature: (!reasoning).then_some(0.0),
        }
    }

    fn chat(&self, messages: Vec<ChatMessage<'_>>) -> Result<String> {
        let key = self.validate()?;
        let request = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(key)
            .json(&self.build_request(messages));

        let reply: ChatCompletionResponse = execute(PROVIDER, &self.model, request)?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::OperationFailed {
                operation: format!("{PROVIDER}_response"),
                cause: "No choices in response".to_string(),
            })
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt)])
    }

    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage::user(user),
        ])
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> ChatMessage<'a> {
    const fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn keyless() -> OpenAiClient {
        OpenAiClient {
            api_key: None,
            endpoint: OpenAiClient::DEFAULT_ENDPOINT.to_string(),
            model: OpenAiClient::DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client: reqwest::blocking::Client::new(),
        }
    }

    #[test]
    fn test_builder_sets_fields() {
        let client = keyless()
            .with_api_key("test-key")
            .with_endpoint("https://custom.endpoint/v1/")
            .with_model("gpt-4");

        assert_eq!(client.name(), "openai");
        assert!(client.has_api_key());
        assert_eq!(client.endpoint, "https://custom.endpoint/v1");
        assert_eq!(client.model, "gpt-4");
        assert_eq!(client.validate().unwrap(), "test-key");
    }

    #[test]
    fn test_missing_key_fails_before_network() {
        let err = keyless().complete("hi").unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY not set"));
    }

    #[test_case("o1-preview", true)]
    #[test_case("o3-mini", true)]
    #[test_case("gpt-5-nano", true)]
    #[test_case("gpt-4o-mini", false)]
    #[test_case("gpt-4", false)]
    fn test_reasoning_model_detection(model: &str, expected: bool) {
        assert_eq!(keyless().with_model(model).is_reasoning_model(), expected);
    }

    #[test]
    fn test_reasoning_model_request_shape() {
        let client = keyless().with_model("o3-mini");
        let json = serde_json::to_value(client.build_request(vec![])).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["max_completion_tokens"], DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_chat_model_request_is_deterministic() {
        let client = keyless();
        let json = serde_json::to_value(client.build_request(vec![ChatMessage::user("hi")])).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], DEFAULT_MAX_TOKENS);
        assert!(json.get("max_completion_tokens").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
