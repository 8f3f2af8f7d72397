//! Context store construction from configuration.
//!
//! ```text
//! StorageConfig.backend
//!   ├── memory   → MemoryContextStore
//!   ├── redis    → RedisContextStore     (feature "redis")
//!   └── postgres → PostgresContextStore  (feature "postgres")
//! ```
//!
//! External backends fail fast: a misconfigured URL or unreachable server is
//! an error at startup, never a silent fallback to memory.

use crate::config::{StorageBackend, StorageConfig};
use crate::storage::{ContextStore, MemoryContextStore};
use crate::{Error, Result};
use std::sync::Arc;

/// Builds the configured context store.
///
/// # Errors
///
/// Returns an error if the backend's feature is not compiled in, its URL is
/// missing, or the connection fails.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ContextStore>> {
    let store: Arc<dyn ContextStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryContextStore::new()),
        StorageBackend::Redis => create_redis(config)?,
        StorageBackend::Postgres => create_postgres(config)?,
    };
    tracing::info!(backend = store.name(), "Context store ready");
    Ok(store)
}

fn require_url<'a>(config: &'a StorageConfig, env_hint: &str) -> Result<&'a str> {
    config.url.as_deref().ok_or_else(|| {
        Error::InvalidInput(format!(
            "storage backend '{}' needs a URL (storage.url, TRACECONTEXT_STORAGE_URL or {env_hint})",
            config.backend.as_str()
        ))
    })
}

#[cfg(feature = "redis")]
fn create_redis(config: &StorageConfig) -> Result<Arc<dyn ContextStore>> {
    let url = require_url(config, "REDIS_URL")?;
    Ok(Arc::new(crate::storage::RedisContextStore::new(
        url,
        config.namespace.clone(),
    )?))
}

#[cfg(not(feature = "redis"))]
fn create_redis(config: &StorageConfig) -> Result<Arc<dyn ContextStore>> {
    require_url(config, "REDIS_URL")?;
    Err(Error::FeatureNotEnabled("redis".to_string()))
}

#[cfg(feature = "postgres")]
fn create_postgres(config: &StorageConfig) -> Result<Arc<dyn ContextStore>> {
    let url = require_url(config, "DATABASE_URL")?;
    Ok(Arc::new(crate::storage::PostgresContextStore::new(
        url,
        config.namespace.clone(),
    )?))
}

#[cfg(not(feature = "postgres"))]
fn create_postgres(config: &StorageConfig) -> Result<Arc<dyn ContextStore>> {
    require_url(config, "DATABASE_URL")?;
    Err(Error::FeatureNotEnabled("postgres".to_string()))
}
