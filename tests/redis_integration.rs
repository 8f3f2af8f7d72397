//! Redis Integration Tests
//!
//! Tests the Redis context store against a live server, focusing on:
//! - Insertion order across append and list
//! - Keyword search with the fallback-to-everything rule
//! - Reset counts and idempotence
//! - Records surviving a reconnect
//!
//! These tests require a running Redis server. Set the environment variable
//! `TRACECONTEXT_TEST_REDIS_URL` to enable these tests:
//!
//! ```bash
//! export TRACECONTEXT_TEST_REDIS_URL="redis://localhost:6379"
//! cargo test --features redis redis_integration
//! ```

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::doc_markdown,
    clippy::print_stderr
)]
#![cfg(feature = "redis")]

use std::env;
use tracecontext::ContextStore;
use tracecontext::models::{ContextRecord, RecordId, RecordKind};
use tracecontext::storage::RedisContextStore;
use uuid::Uuid;

/// Environment variable for Redis test connection URL.
const REDIS_URL_ENV: &str = "TRACECONTEXT_TEST_REDIS_URL";

/// Returns the Redis connection URL if available, or None to skip tests.
fn get_redis_url() -> Option<String> {
    env::var(REDIS_URL_ENV).ok()
}

/// Macro to skip tests when Redis is not available.
macro_rules! require_redis {
    () => {
        match get_redis_url() {
            Some(url) => url,
            None => {
                eprintln!(
                    "Skipping test: {} not set. Set this environment variable to run Redis tests.",
                    REDIS_URL_ENV
                );
                return;
            },
        }
    };
}

/// A store on a fresh key, so parallel tests never share a list.
fn fresh_store(url: &str) -> (RedisContextStore, String) {
    let key = format!("tracecontext:test:{}", Uuid::new_v4().simple());
    let store = RedisContextStore::new(url, key.clone()).expect("Failed to connect to Redis");
    (store, key)
}

fn record(kind: RecordKind, content: &str) -> ContextRecord {
    ContextRecord::new(RecordId::generate(), kind, content)
}

#[test]
fn test_append_preserves_order() {
    let url = require_redis!();
    let (store, _key) = fresh_store(&url);

    store.append(record(RecordKind::Adr, "Title: Adopt Kafka")).unwrap();
    store.append(record(RecordKind::DeadEnd, "Approach: Braintree")).unwrap();
    store.append(record(RecordKind::MapUpdate, "Codebase map updated.")).unwrap();

    let all = store.list_all().unwrap();
    let formatted: Vec<String> = all.iter().map(ContextRecord::formatted).collect();
    assert_eq!(
        formatted,
        vec![
            "[ADR] Title: Adopt Kafka",
            "[DEAD_END] Approach: Braintree",
            "[MAP_UPDATE] Codebase map updated.",
        ]
    );
    assert_eq!(store.count().unwrap(), 3);
    store.reset().unwrap();
}

#[test]
fn test_record_fields_roundtrip() {
    let url = require_redis!();
    let (store, _key) = fresh_store(&url);

    let mut metadata = std::collections::BTreeMap::new();
    metadata.insert("repo".to_string(), serde_json::json!("payments"));
    let original = record(RecordKind::Adr, "Title: x")
        .with_degraded(true)
        .with_metadata(metadata);
    store.append(original.clone()).unwrap();

    let stored = store.list_all().unwrap().pop().unwrap();
    assert_eq!(stored.id, original.id);
    assert!(stored.degraded);
    assert_eq!(stored.metadata["repo"], "payments");
    store.reset().unwrap();
}

#[test]
fn test_search_and_fallback() {
    let url = require_redis!();
    let (store, _key) = fresh_store(&url);

    store.append(record(RecordKind::Adr, "Title: Use Redis cache")).unwrap();
    store.append(record(RecordKind::Adr, "Title: Use Kafka")).unwrap();

    let hits = store.search("REDIS").unwrap();
    assert!(!hits.fallback);
    assert_eq!(hits.records.len(), 1);

    let tagged = store.search("adr").unwrap();
    assert_eq!(tagged.records.len(), 2);

    let miss = store.search("graphql").unwrap();
    assert!(miss.fallback);
    assert_eq!(miss.records.len(), 2);
    store.reset().unwrap();
}

#[test]
fn test_reset_counts_and_is_idempotent() {
    let url = require_redis!();
    let (store, _key) = fresh_store(&url);

    store.append(record(RecordKind::MapUpdate, "a")).unwrap();
    store.append(record(RecordKind::MapUpdate, "b")).unwrap();

    assert_eq!(store.reset().unwrap(), 2);
    assert_eq!(store.reset().unwrap(), 0);
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn test_records_survive_new_store_instance() {
    let url = require_redis!();
    let (store, key) = fresh_store(&url);
    store.append(record(RecordKind::DeadEnd, "Approach: polling")).unwrap();
    drop(store);

    let reopened = RedisContextStore::new(&url, key).unwrap();
    assert_eq!(reopened.count().unwrap(), 1);
    reopened.reset().unwrap();
}

#[test]
fn test_unreachable_server_fails_fast() {
    // Runs without a live server.
    let result = RedisContextStore::new("redis://127.0.0.1:1", "tracecontext:test:none");
    assert!(result.is_err());
}
