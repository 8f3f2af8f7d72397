//! LLM Client Integration Tests
//!
//! Tests the hosted-provider clients against a mock HTTP endpoint:
//! - Request shape and authentication headers per provider
//! - Error status and connection failures surfacing as errors
//! - Agents consuming real client output, including markdown-fenced JSON
//! - Agents absorbing provider failures into placeholder records
//!
//! These tests do NOT require actual API keys; the mock listens on loopback.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;
use tracecontext::llm::prompts::DISTILL_SYSTEM_PROMPT;
use tracecontext::llm::{AnthropicClient, LlmHttpConfig, OpenAiClient};
use tracecontext::models::DegradedReason;
use tracecontext::services::DistillationAgent;
use tracecontext::{Error, LlmProvider};

const ANTHROPIC_TEST_KEY: &str = "sk-ant-REDACTED";

// ============================================================================
// Mock Provider
// ============================================================================

/// Captured request: headers and JSON body.
type Captured = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

#[derive(Clone)]
struct MockProvider {
    status: StatusCode,
    reply: Value,
    requests: Captured,
}

async fn handle(
    State(mock): State<MockProvider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    mock.requests.lock().unwrap().push((headers, body));
    (mock.status, Json(mock.reply))
}

/// Serves `reply` with `status` on both provider paths. Returns the `/v1`
/// base URL and the request log.
fn spawn_mock(status: StatusCode, reply: Value) -> (String, Captured) {
    let requests: Captured = Arc::default();
    let mock = MockProvider {
        status,
        reply,
        requests: Arc::clone(&requests),
    };

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route("/v1/messages", post(handle))
                .route("/v1/chat/completions", post(handle))
                .with_state(mock);
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    let addr = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    (format!("http://{addr}/v1"), requests)
}

fn anthropic_reply(text: &str) -> Value {
    json!({"content": [{"type": "text", "text": text}]})
}

fn openai_reply(text: &str) -> Value {
    json!({"choices": [{"message": {"role": "assistant", "content": text}}]})
}

fn fast_http() -> LlmHttpConfig {
    LlmHttpConfig {
        timeout_ms: 5_000,
        connect_timeout_ms: 1_000,
    }
}

// ============================================================================
// Anthropic
// ============================================================================

mod anthropic {
    use super::*;

    fn client(endpoint: &str) -> AnthropicClient {
        AnthropicClient::new()
            .with_api_key(ANTHROPIC_TEST_KEY)
            .with_endpoint(endpoint)
            .with_model("claude-test")
            .with_max_tokens(256)
            .with_http_config(fast_http())
    }

    #[test]
    fn test_request_shape_and_headers() {
        let (endpoint, requests) = spawn_mock(StatusCode::OK, anthropic_reply("pong"));

        let reply = client(&endpoint).complete_with_system("be brief", "ping").unwrap();
        assert_eq!(reply, "pong");

        let log = requests.lock().unwrap();
        let (headers, body) = &log[0];
        assert_eq!(headers["x-api-key"], ANTHROPIC_TEST_KEY);
        assert_eq!(headers["anthropic-version"], "2023-06-01");
        assert_eq!(body["model"], "claude-test");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "ping");
    }

    #[test]
    fn test_error_status_is_reported() {
        let (endpoint, _) = spawn_mock(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "rate limited"}}),
        );

        let err = client(&endpoint).complete("ping").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("anthropic_request"));
        assert!(message.contains("429"));
        assert!(message.contains("rate limited"));
    }

    #[test]
    fn test_response_without_text_block() {
        let (endpoint, _) = spawn_mock(
            StatusCode::OK,
            json!({"content": [{"type": "tool_use", "id": "x"}]}),
        );
        let err = client(&endpoint).complete("ping").unwrap_err();
        assert!(err.to_string().contains("No text content"));
    }

    #[test]
    fn test_malformed_key_never_hits_network() {
        let (endpoint, requests) = spawn_mock(StatusCode::OK, anthropic_reply("unused"));
        let client = AnthropicClient::new()
            .with_api_key("not-a-real-key")
            .with_endpoint(endpoint);

        assert!(client.complete("ping").is_err());
        assert!(requests.lock().unwrap().is_empty());
    }
}

// ============================================================================
// OpenAI
// ============================================================================

mod openai {
    use super::*;

    fn client(endpoint: &str, model: &str) -> OpenAiClient {
        OpenAiClient::new()
            .with_api_key("sk-test")
            .with_endpoint(endpoint)
            .with_model(model)
            .with_http_config(fast_http())
    }

    #[test]
    fn test_request_shape_and_headers() {
        let (endpoint, requests) = spawn_mock(StatusCode::OK, openai_reply("pong"));

        let reply = client(&endpoint, "gpt-4o-mini")
            .complete_with_system("be brief", "ping")
            .unwrap();
        assert_eq!(reply, "pong");

        let log = requests.lock().unwrap();
        let (headers, body) = &log[0];
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("max_tokens").is_some());
    }

    #[test]
    fn test_reasoning_model_uses_completion_tokens() {
        let (endpoint, requests) = spawn_mock(StatusCode::OK, openai_reply("ok"));
        client(&endpoint, "o3-mini").complete("ping").unwrap();

        let log = requests.lock().unwrap();
        let body = &log[0].1;
        assert!(body.get("max_completion_tokens").is_some());
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_empty_choices_is_an_error() {
        let (endpoint, _) = spawn_mock(StatusCode::OK, json!({"choices": []}));
        let err = client(&endpoint, "gpt-4o-mini").complete("ping").unwrap_err();
        assert!(err.to_string().contains("No choices"));
    }

    #[test]
    fn test_unreachable_endpoint() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let err = client("http://127.0.0.1:9/v1", "gpt-4o-mini")
            .complete("ping")
            .unwrap_err();
        assert!(matches!(err, Error::OperationFailed { ref operation, .. } if operation == "openai_request"));
    }
}

// ============================================================================
// Agents Over Real Clients
// ============================================================================

mod agents {
    use super::*;

    #[test]
    fn test_distillation_parses_fenced_reply() {
        let adr = json!({
            "title": "Adopt Stripe",
            "status": "Accepted",
            "context": "Braintree covers 46 countries",
            "decision": "Move payments to Stripe",
            "consequences": "Migration effort"
        });
        let (endpoint, requests) = spawn_mock(
            StatusCode::OK,
            anthropic_reply(&format!("Here you go:\n```json\n{adr}\n```")),
        );
        let llm: Arc<dyn LlmProvider> = Arc::new(
            AnthropicClient::new()
                .with_api_key(ANTHROPIC_TEST_KEY)
                .with_endpoint(endpoint)
                .with_http_config(fast_http()),
        );

        let outcome = DistillationAgent::new(Some(llm)).distill("+stripe", "refactor: <Stripe>");
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.record().title, "Adopt Stripe");

        let log = requests.lock().unwrap();
        let body = &log[0].1;
        assert_eq!(body["system"], DISTILL_SYSTEM_PROMPT);
        let user = body["messages"][0]["content"].as_str().unwrap();
        assert!(user.contains("refactor: &lt;Stripe&gt;"));
    }

    #[test]
    fn test_distillation_absorbs_server_error() {
        let (endpoint, _) = spawn_mock(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"}));
        let llm: Arc<dyn LlmProvider> = Arc::new(
            OpenAiClient::new()
                .with_api_key("sk-test")
                .with_endpoint(endpoint)
                .with_http_config(fast_http()),
        );

        let outcome = DistillationAgent::new(Some(llm)).distill("diff", "feat: cache");
        assert!(matches!(
            outcome.reason(),
            Some(DegradedReason::ProviderFailed(cause)) if cause.contains("500")
        ));
        assert_eq!(outcome.record().title, "Architecture Change Detected");
        assert_eq!(outcome.record().decision, "feat: cache");
    }
}
