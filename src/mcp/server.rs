//! MCP server over stdio.
//!
//! One JSON-RPC 2.0 request per line on stdin, one response per line on
//! stdout. Logging must never write to stdout.

use super::dispatch::{
    INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, McpMethod, PARSE_ERROR,
};
use super::{resources, tools};
use crate::client::OrchestratorApi;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::{BufRead, Write};
use std::time::Instant;
use tracing::info_span;

/// Protocol version announced on `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name announced on `initialize`.
pub const SERVER_NAME: &str = "tracecontext";

/// Usage instructions announced on `initialize`.
pub const INSTRUCTIONS: &str = "TraceContext is the persistent memory layer for this codebase. \
    ALWAYS call `search_context` before answering questions about architecture, past \
    decisions, or why something was built a certain way. If the user makes a significant \
    architectural decision during this session, call `add_decision` to persist it. If an \
    approach is abandoned or fails, call `add_dead_end` immediately so future sessions never \
    repeat the mistake.";

/// Maximum accepted request line (1 MiB).
const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// JSON-RPC "invalid request" code, used for oversized lines.
const INVALID_REQUEST: i32 = -32600;

type DispatchResult = std::result::Result<Value, (i32, String)>;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[serde(rename = "jsonrpc")]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// MCP server exposing the orchestrator to AI coding tools.
pub struct McpServer<A: OrchestratorApi> {
    api: A,
}

impl<A: OrchestratorApi> McpServer<A> {
    /// Creates a server backed by an orchestrator API.
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    /// Serves requests from stdin until EOF.
    ///
    /// # Errors
    ///
    /// Returns an error if stdin or stdout fails.
    pub fn run_stdio(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.run(stdin.lock(), stdout.lock())
    }

    /// Serves requests from `reader`, writing responses to `writer`.
    ///
    /// Notifications (requests without an id) get no response line.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub fn run<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<()> {
        tracing::info!(protocol = PROTOCOL_VERSION, "MCP server started on stdio");

        for line in reader.lines() {
            let line = line.map_err(|e| io_error("read_stdin", &e))?;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_request(&line) {
                writeln!(writer, "{response}").map_err(|e| io_error("write_stdout", &e))?;
                writer.flush().map_err(|e| io_error("flush_stdout", &e))?;
            }
        }

        tracing::info!("MCP server input closed");
        Ok(())
    }

    /// Handles one request line, returning the response line.
    ///
    /// Returns `None` for notifications.
    pub fn handle_request(&self, request: &str) -> Option<String> {
        if request.len() > MAX_REQUEST_BYTES {
            tracing::warn!(size = request.len(), "MCP request too large");
            return Some(format_error(
                None,
                INVALID_REQUEST,
                &format!("Request too large: {} bytes", request.len()),
            ));
        }

        let start = Instant::now();
        let span = info_span!(
            "mcp.request",
            rpc.method = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let req: JsonRpcRequest = match serde_json::from_str(request) {
            Ok(req) => req,
            Err(e) => {
                span.record("status", "parse_error");
                record_request("parse_error", "error", start);
                return Some(format_error(None, PARSE_ERROR, &format!("Parse error: {e}")));
            },
        };

        let method = McpMethod::parse(&req.method);
        let label = method.map_or("unknown", McpMethod::name);
        span.record("rpc.method", req.method.as_str());
        tracing::debug!(method = %req.method, "Processing MCP request");

        let is_notification = req.id.is_none();
        let result = match method {
            Some(method) => self.dispatch(method, req.params),
            None => Err((METHOD_NOT_FOUND, format!("Method not found: {}", req.method))),
        };
        let status = if result.is_ok() { "success" } else { "error" };
        span.record("status", status);
        record_request(label, status, start);

        if is_notification {
            return None;
        }
        Some(format_response(req.id, result))
    }

    fn dispatch(&self, method: McpMethod, params: Option<Value>) -> DispatchResult {
        match method {
            McpMethod::Initialize => Ok(initialize_result()),
            McpMethod::Ping => Ok(json!({})),
            McpMethod::ListTools => Ok(json!({ "tools": tools::list_tools() })),
            McpMethod::CallTool => self.call_tool(params),
            McpMethod::ListResources => Ok(json!({ "resources": resources::list_resources() })),
            McpMethod::ReadResource => self.read_resource(params),
        }
    }

    fn call_tool(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((INVALID_PARAMS, "Missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let _span = info_span!("mcp.tool.call", tool.name = name).entered();
        let result = match tools::execute(&self.api, name, arguments) {
            Ok(result) => result,
            Err(e) => tools::ToolResult::error(e.to_string()),
        };
        if result.is_error {
            tracing::warn!(tool = name, "Tool call failed");
        }

        serde_json::to_value(result).map_err(|e| (INTERNAL_ERROR, e.to_string()))
    }

    fn read_resource(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((INVALID_PARAMS, "Missing params".to_string()))?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or((INVALID_PARAMS, "Missing resource URI".to_string()))?;

        let content = resources::read_resource(&self.api, uri).map_err(|e| match e {
            Error::InvalidInput(msg) => (INVALID_PARAMS, msg),
            other => (INTERNAL_ERROR, other.to_string()),
        })?;
        Ok(json!({ "contents": [content] }))
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": INSTRUCTIONS
    })
}

fn format_response(id: Option<Value>, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0",
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

fn format_error(id: Option<Value>, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

fn record_request(method: &'static str, status: &'static str, start: Instant) {
    metrics::counter!("tracecontext_mcp_requests_total", "method" => method, "status" => status)
        .increment(1);
    metrics::histogram!("tracecontext_mcp_request_duration_ms", "method" => method)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}

fn io_error(operation: &str, e: &std::io::Error) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}
