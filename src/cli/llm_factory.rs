//! Builds the provider shared by the distillation, dead-end and ranking
//! agents from the `[llm]` configuration.

use std::sync::Arc;

use crate::config::{LlmConfig, LlmProvider as Provider};
use crate::llm::{AnthropicClient, LlmHttpConfig, LlmProvider, OpenAiClient};
use secrecy::ExposeSecret;

/// Applies the optional `[llm]` overrides to a freshly built client.
///
/// Both hosted clients expose the same builder methods.
macro_rules! apply_overrides {
    ($client:expr, $config:expr) => {{
        let config: &LlmConfig = $config;
        let mut client = $client.with_http_config(LlmHttpConfig::from_config(config));
        if let Some(key) = &config.api_key {
            client = client.with_api_key(key.expose_secret());
        }
        if let Some(model) = &config.model {
            client = client.with_model(model);
        }
        if let Some(url) = &config.base_url {
            client = client.with_endpoint(url);
        }
        if let Some(max_tokens) = config.max_tokens {
            client = client.with_max_tokens(max_tokens);
        }
        client
    }};
}

/// Anthropic client with configuration overrides applied.
#[must_use]
pub fn build_anthropic_client(config: &LlmConfig) -> AnthropicClient {
    apply_overrides!(AnthropicClient::new(), config)
}

/// `OpenAI` client with configuration overrides applied.
#[must_use]
pub fn build_openai_client(config: &LlmConfig) -> OpenAiClient {
    apply_overrides!(OpenAiClient::new(), config)
}

/// Builds the configured LLM provider.
///
/// Returns `None` when the provider is disabled or has no API key; the
/// agents then produce placeholder records.
#[must_use]
pub fn build_llm_provider(config: &LlmConfig) -> Option<Arc<dyn LlmProvider>> {
    let (provider, key_var): (Arc<dyn LlmProvider>, &str) = match config.provider {
        Provider::None => {
            tracing::info!("LLM provider disabled, agents will store placeholder records");
            return None;
        },
        Provider::Anthropic => {
            let client = build_anthropic_client(config);
            if !client.has_api_key() {
                tracing::warn!(env = "ANTHROPIC_API_KEY", "No LLM key, agents will store placeholder records");
                return None;
            }
            (Arc::new(client), "ANTHROPIC_API_KEY")
        },
        Provider::OpenAi => {
            let client = build_openai_client(config);
            if !client.has_api_key() {
                tracing::warn!(env = "OPENAI_API_KEY", "No LLM key, agents will store placeholder records");
                return None;
            }
            (Arc::new(client), "OPENAI_API_KEY")
        },
    };

    tracing::info!(provider = provider.name(), env = key_var, "LLM provider configured");
    Some(provider)
}
