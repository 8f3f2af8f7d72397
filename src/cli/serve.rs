//! Serve command: runs the HTTP ingestion API.

use super::llm_factory::build_llm_provider;
use crate::config::TraceContextConfig;
use crate::llm::LlmProvider;
use crate::services::{EventRouter, IngestionService, RankingAgent, create_store};
use crate::storage::ContextStore;
use crate::{Error, Result};
use std::sync::Arc;

/// Builds the ingestion service from configuration.
///
/// One provider instance is shared by every agent. External stores connect
/// here, so a misconfigured backend fails before the port is bound.
///
/// # Errors
///
/// Returns an error if the store cannot be created.
pub fn build_service(config: &TraceContextConfig) -> Result<IngestionService> {
    let llm = build_llm_provider(&config.llm);
    let store = create_store(&config.storage)?;
    Ok(assemble(config, llm, store))
}

fn assemble(
    config: &TraceContextConfig,
    llm: Option<Arc<dyn LlmProvider>>,
    store: Arc<dyn ContextStore>,
) -> IngestionService {
    IngestionService::new(EventRouter::new(llm.clone()), RankingAgent::new(llm), store)
        .with_rerank(config.search.rerank)
}

/// Runs the orchestrator until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the runtime, the store, or the listener fails.
pub fn cmd_serve(config: &TraceContextConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tracecontext-worker")
        .build()
        .map_err(|e| Error::OperationFailed {
            operation: "create_runtime".to_string(),
            cause: e.to_string(),
        })?;

    let llm = build_llm_provider(&config.llm);
    // The PostgreSQL pool binds to the runtime it is created in.
    let store = {
        let _guard = runtime.enter();
        create_store(&config.storage)?
    };

    runtime.block_on(crate::server::serve(
        assemble(config, llm, store),
        &config.server,
    ))
}
