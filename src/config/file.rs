//! On-disk TOML representation.
//!
//! Every field is optional so a file only needs the keys it overrides.

use serde::Deserialize;

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// LLM section.
    pub llm: Option<ConfigFileLlm>,
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Search section.
    pub search: Option<ConfigFileSearch>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
    /// Client section.
    pub client: Option<ConfigFileClient>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
    /// Permissive CORS.
    pub cors: Option<bool>,
    /// Body size limit.
    pub max_body_bytes: Option<usize>,
}

/// LLM section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Provider name.
    pub provider: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key, literal or `${VAR}`.
    pub api_key: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
    /// Connect timeout.
    pub connect_timeout_ms: Option<u64>,
    /// Output token limit.
    pub max_tokens: Option<u32>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Backend name.
    pub backend: Option<String>,
    /// Connection URL.
    pub url: Option<String>,
    /// List key or table name.
    #[serde(alias = "key", alias = "table")]
    pub namespace: Option<String>,
}

/// Search section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSearch {
    /// Re-rank keyword hits.
    pub rerank: Option<bool>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty`, `compact` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMetrics {
    /// Expose a Prometheus endpoint.
    pub expose: Option<bool>,
    /// Endpoint port.
    pub port: Option<u16>,
}

/// Client section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileClient {
    /// Orchestrator base URL.
    pub orchestrator_url: Option<String>,
    /// Request timeout.
    pub timeout_ms: Option<u64>,
}
