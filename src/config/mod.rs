//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. The binary loads `.env` before any of this.

mod file;

pub use file::{
    ConfigFile, ConfigFileClient, ConfigFileLlm, ConfigFileLogging, ConfigFileMetrics,
    ConfigFileSearch, ConfigFileServer, ConfigFileStorage,
};

use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "TRACECONTEXT_";

/// Main configuration for tracecontext.
#[derive(Debug, Clone, Default)]
pub struct TraceContextConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// LLM provider settings.
    pub llm: LlmConfig,
    /// Context store settings.
    pub storage: StorageConfig,
    /// Search settings.
    pub search: SearchConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Metrics settings.
    pub metrics: MetricsSettings,
    /// Orchestrator client settings (CLI, hook, MCP).
    pub client: ClientConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Whether to add a permissive CORS layer (for browser dashboards).
    pub cors: bool,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors: true,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    /// Provider.
    pub provider: LlmProvider,
    /// Model name.
    pub model: Option<String>,
    /// API key. Falls back to the provider's standard env var when unset.
    pub api_key: Option<SecretString>,
    /// Base URL for the provider (proxies, gateways).
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Maximum output tokens per request.
    pub max_tokens: Option<u32>,
}

/// Available LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Anthropic Claude.
    #[default]
    Anthropic,
    /// `OpenAI` GPT.
    OpenAi,
    /// No provider: every agent uses its placeholder path.
    None,
}

impl LlmProvider {
    /// Parses a provider string. Unknown names fall back to Anthropic.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "openai" => Self::OpenAi,
            "none" | "disabled" | "off" => Self::None,
            _ => Self::Anthropic,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::None => "none",
        }
    }
}

/// Context store settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Which backend holds the records.
    pub backend: StorageBackend,
    /// Connection URL for Redis or PostgreSQL.
    pub url: Option<String>,
    /// Redis list key or PostgreSQL table name.
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            url: None,
            namespace: "tracecontext_records".to_string(),
        }
    }
}

/// Available store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// In-process list (default).
    #[default]
    Memory,
    /// Redis list.
    Redis,
    /// PostgreSQL table.
    Postgres,
}

impl StorageBackend {
    /// Parses a backend name.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names.
    pub fn parse(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown storage backend '{other}' (expected memory, redis or postgres)"
            ))),
        }
    }

    /// Returns the backend name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Postgres => "postgres",
        }
    }
}

/// Search settings.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Whether keyword hits are re-ranked by the ranking agent.
    pub rerank: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { rerank: true }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    #[default]
    Compact,
    /// JSON lines.
    Json,
}

impl LogFormat {
    /// Parses a format name. Unknown names fall back to compact.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional log file (stderr when unset).
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Metrics settings.
#[derive(Debug, Clone, Copy)]
pub struct MetricsSettings {
    /// Whether to expose a Prometheus scrape endpoint.
    pub expose: bool,
    /// Port of the scrape endpoint.
    pub port: u16,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            expose: false,
            port: 9090,
        }
    }
}

/// Orchestrator client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the orchestrator HTTP API.
    pub orchestrator_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:8000".to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl TraceContextConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or holds invalid values.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/tracecontext/` on macOS)
    /// 2. XDG config dir (`~/.config/tracecontext/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs
                .config_dir()
                .join("tracecontext")
                .join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("tracecontext")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file"),
            }
        }

        Self::default()
    }

    /// Loads configuration the way the binary does: explicit file or default
    /// location, then process environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be loaded or an
    /// environment value is invalid.
    pub fn load(explicit: Option<&Path>) -> crate::Result<Self> {
        let config = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Converts a `ConfigFile` to `TraceContextConfig`.
    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
            if let Some(cors) = server.cors {
                config.server.cors = cors;
            }
            if let Some(max_body_bytes) = server.max_body_bytes {
                config.server.max_body_bytes = max_body_bytes;
            }
        }
        if let Some(llm) = file.llm {
            if let Some(provider) = llm.provider {
                config.llm.provider = LlmProvider::parse(&provider);
            }
            config.llm.model = llm.model;
            config.llm.api_key = llm
                .api_key
                .and_then(|raw| expand_env_reference(&raw, |key| std::env::var(key).ok()))
                .map(SecretString::from);
            config.llm.base_url = llm.base_url;
            config.llm.timeout_ms = llm.timeout_ms;
            config.llm.connect_timeout_ms = llm.connect_timeout_ms;
            config.llm.max_tokens = llm.max_tokens;
        }
        if let Some(storage) = file.storage {
            if let Some(backend) = storage.backend {
                config.storage.backend = StorageBackend::parse(&backend)?;
            }
            config.storage.url = storage.url;
            if let Some(namespace) = storage.namespace {
                config.storage.namespace = namespace;
            }
        }
        if let Some(rerank) = file.search.and_then(|s| s.rerank) {
            config.search.rerank = rerank;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }
        if let Some(metrics) = file.metrics {
            if let Some(expose) = metrics.expose {
                config.metrics.expose = expose;
            }
            if let Some(port) = metrics.port {
                config.metrics.port = port;
            }
        }
        if let Some(client) = file.client {
            if let Some(url) = client.orchestrator_url {
                config.client.orchestrator_url = url;
            }
            if let Some(timeout_ms) = client.timeout_ms {
                config.client.timeout_ms = timeout_ms;
            }
        }

        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// `lookup` is `std::env::var` in the binary; tests pass a map instead of
    /// mutating the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric, boolean or enum value cannot be parsed.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(cors) = var("CORS") {
            self.server.cors = parse_bool("CORS", &cors)?;
        }
        if let Some(provider) = var("LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider);
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(key) = var("LLM_API_KEY") {
            self.llm.api_key = Some(SecretString::from(key));
        }
        if let Some(base_url) = var("LLM_BASE_URL") {
            self.llm.base_url = Some(base_url);
        }
        if let Some(timeout) = var("LLM_TIMEOUT_MS") {
            self.llm.timeout_ms = Some(parse_env("LLM_TIMEOUT_MS", &timeout)?);
        }
        if let Some(timeout) = var("LLM_CONNECT_TIMEOUT_MS") {
            self.llm.connect_timeout_ms = Some(parse_env("LLM_CONNECT_TIMEOUT_MS", &timeout)?);
        }
        if let Some(backend) = var("STORAGE") {
            self.storage.backend = StorageBackend::parse(&backend)?;
        }
        if let Some(url) = var("STORAGE_URL") {
            self.storage.url = Some(url);
        }
        if self.storage.url.is_none() {
            self.storage.url = match self.storage.backend {
                StorageBackend::Redis => lookup("REDIS_URL"),
                StorageBackend::Postgres => lookup("DATABASE_URL"),
                StorageBackend::Memory => None,
            };
        }
        if let Some(rerank) = var("RERANK") {
            self.search.rerank = parse_bool("RERANK", &rerank)?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(file) = var("LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(expose) = var("METRICS_EXPOSE") {
            self.metrics.expose = parse_bool("METRICS_EXPOSE", &expose)?;
        }
        if let Some(port) = var("METRICS_PORT") {
            self.metrics.port = parse_env("METRICS_PORT", &port)?;
        }
        if let Some(url) = var("ORCHESTRATOR_URL").or_else(|| lookup("ORCHESTRATOR_URL")) {
            self.client.orchestrator_url = url;
        }

        Ok(self)
    }

    /// Renders the effective configuration as TOML-like text with secrets
    /// redacted.
    #[must_use]
    pub fn describe(&self) -> String {
        let api_key = match &self.llm.api_key {
            Some(key) if !key.expose_secret().is_empty() => "<redacted>",
            _ => "<from provider env var>",
        };
        format!(
            "[server]\nhost = {:?}\nport = {}\ncors = {}\nmax_body_bytes = {}\n\n\
             [llm]\nprovider = {:?}\nmodel = {:?}\napi_key = {api_key}\nbase_url = {:?}\n\n\
             [storage]\nbackend = {:?}\nurl = {}\nnamespace = {:?}\n\n\
             [search]\nrerank = {}\n\n\
             [logging]\nlevel = {:?}\nformat = {:?}\nfile = {:?}\n\n\
             [metrics]\nexpose = {}\nport = {}\n\n\
             [client]\norchestrator_url = {:?}\ntimeout_ms = {}\n",
            self.server.host,
            self.server.port,
            self.server.cors,
            self.server.max_body_bytes,
            self.llm.provider.as_str(),
            self.llm.model,
            self.llm.base_url,
            self.storage.backend.as_str(),
            if self.storage.url.is_some() {
                "<redacted>"
            } else {
                "<unset>"
            },
            self.storage.namespace,
            self.search.rerank,
            self.logging.level,
            self.logging.format,
            self.logging.file,
            self.metrics.expose,
            self.metrics.port,
            self.client.orchestrator_url,
            self.client.timeout_ms,
        )
    }
}

/// Expands a `${VAR}` reference. Plain values pass through unchanged; a
/// reference to an unset variable yields `None`.
fn expand_env_reference<F>(raw: &str, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        Some(name) => lookup(name).filter(|v| !v.is_empty()),
        None if trimmed.is_empty() => None,
        None => Some(trimmed.to_string()),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        crate::Error::InvalidInput(format!("{ENV_PREFIX}{name}={value}: {e}"))
    })
}

fn parse_bool(name: &str, value: &str) -> crate::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(crate::Error::InvalidInput(format!(
            "{ENV_PREFIX}{name}={value}: expected a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TraceContextConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.llm.provider, LlmProvider::Anthropic);
        assert!(config.search.rerank);
        assert_eq!(config.client.orchestrator_url, "http://localhost:8000");
    }

    #[test]
    fn test_from_toml() {
        let config = TraceContextConfig::from_toml(
            r#"
            [server]
            port = 9100
            cors = false

            [llm]
            provider = "openai"
            model = "gpt-4o-mini"
            api_key = "sk-test"

            [storage]
            backend = "redis"
            url = "redis://localhost:6379"

            [search]
            rerank = false

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9100);
        assert!(!config.server.cors);
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.llm.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(
            config.llm.api_key.as_ref().map(|k| k.expose_secret().to_string()),
            Some("sk-test".to_string())
        );
        assert_eq!(config.storage.backend, StorageBackend::Redis);
        assert!(!config.search.rerank);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_from_toml_rejects_unknown_backend() {
        let result = TraceContextConfig::from_toml("[storage]\nbackend = \"mongo\"\n");
        assert!(matches!(result, Err(crate::Error::InvalidInput(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client]\norchestrator_url = \"http://ctx:9000\"\n").unwrap();

        let config = TraceContextConfig::load_from_file(&path).unwrap();
        assert_eq!(config.client.orchestrator_url, "http://ctx:9000");
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let result = TraceContextConfig::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = TraceContextConfig::default()
            .with_env_overrides(env(&[
                ("TRACECONTEXT_PORT", "8123"),
                ("TRACECONTEXT_LLM_PROVIDER", "none"),
                ("TRACECONTEXT_RERANK", "off"),
                ("TRACECONTEXT_STORAGE", "postgres"),
                ("DATABASE_URL", "postgresql://localhost/tc"),
                ("ORCHESTRATOR_URL", "http://legacy:8000"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 8123);
        assert_eq!(config.llm.provider, LlmProvider::None);
        assert!(!config.search.rerank);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(
            config.storage.url.as_deref(),
            Some("postgresql://localhost/tc")
        );
        assert_eq!(config.client.orchestrator_url, "http://legacy:8000");
    }

    #[test]
    fn test_prefixed_orchestrator_url_wins() {
        let config = TraceContextConfig::default()
            .with_env_overrides(env(&[
                ("TRACECONTEXT_ORCHESTRATOR_URL", "http://new:8000"),
                ("ORCHESTRATOR_URL", "http://legacy:8000"),
            ]))
            .unwrap();
        assert_eq!(config.client.orchestrator_url, "http://new:8000");
    }

    #[test]
    fn test_env_override_invalid_port() {
        let result =
            TraceContextConfig::default().with_env_overrides(env(&[("TRACECONTEXT_PORT", "x")]));
        assert!(matches!(result, Err(crate::Error::InvalidInput(_))));
    }

    #[test]
    fn test_expand_env_reference() {
        let lookup = env(&[("MY_KEY", "secret")]);
        assert_eq!(
            expand_env_reference("${MY_KEY}", &lookup).as_deref(),
            Some("secret")
        );
        assert_eq!(expand_env_reference("${MISSING}", &lookup), None);
        assert_eq!(
            expand_env_reference("literal", &lookup).as_deref(),
            Some("literal")
        );
        assert_eq!(expand_env_reference("  ", &lookup), None);
    }

    #[test]
    fn test_describe_redacts_secrets() {
        let mut config = TraceContextConfig::default();
        config.llm.api_key = Some(SecretString::from("sk-ant-very-secret".to_string()));
        config.storage.url = Some("redis://:password@host".to_string());

        let text = config.describe();
        assert!(!text.contains("very-secret"));
        assert!(!text.contains("password"));
        assert!(text.contains("<redacted>"));
    }
}
