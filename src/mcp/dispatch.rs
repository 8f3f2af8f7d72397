//! JSON-RPC method table and error codes.

/// Malformed JSON on the request line.
pub const PARSE_ERROR: i32 = -32700;
/// The method is not in [`McpMethod`].
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Missing or malformed params, or an unknown resource URI.
pub const INVALID_PARAMS: i32 = -32602;
/// The server failed while handling a valid request.
pub const INTERNAL_ERROR: i32 = -32603;

/// A protocol method the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    /// Session handshake.
    Initialize,
    /// Liveness probe.
    Ping,
    /// `tools/list`.
    ListTools,
    /// `tools/call`.
    CallTool,
    /// `resources/list`.
    ListResources,
    /// `resources/read`.
    ReadResource,
}

const METHODS: [(&str, McpMethod); 6] = [
    ("initialize", McpMethod::Initialize),
    ("ping", McpMethod::Ping),
    ("tools/list", McpMethod::ListTools),
    ("tools/call", McpMethod::CallTool),
    ("resources/list", McpMethod::ListResources),
    ("resources/read", McpMethod::ReadResource),
];

impl McpMethod {
    /// Looks up a method by its wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        METHODS
            .iter()
            .find(|(wire, _)| *wire == name)
            .map(|(_, method)| *method)
    }

    /// The wire name, also used as the metrics label.
    #[must_use]
    pub fn name(self) -> &'static str {
        METHODS
            .iter()
            .find(|(_, method)| *method == self)
            .map_or("unknown", |(wire, _)| wire)
    }
}
