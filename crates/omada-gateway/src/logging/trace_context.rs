//! Per-request trace data

use serde_json::Value;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;
use tracing::{info, info_span, Span};

static NEXT_TRACE: AtomicU32 = AtomicU32::new(1);

/// Six hex digits, unique among recent requests of this process
pub fn generate_trace_id() -> String {
    let seq = NEXT_TRACE.fetch_add(1, Ordering::Relaxed);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    // Sequence in the low bits keeps consecutive ids distinct
    format!("{:06x}", ((nanos >> 12) << 12 | (seq & 0xFFF)) & 0xFF_FFFF)
}

/// JSON-RPC message carried by a `/mcp` POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpCall {
    pub rpc_method: String,
    /// Tool name for `tools/call`
    pub tool: Option<String>,
    /// Number of messages when the body is a batch
    pub batch: usize,
}

impl McpCall {
    /// Inspect a request body; `None` for responses, notifications without a method or non-JSON
    pub fn from_body(bytes: &[u8]) -> Option<Self> {
        let json: Value = serde_json::from_slice(bytes).ok()?;
        let (first, batch) = match &json {
            Value::Array(items) => (items.first()?, items.len()),
            single => (single, 1),
        };
        let rpc_method = first.get("method")?.as_str()?.to_string();
        let tool = (rpc_method == "tools/call")
            .then(|| first.pointer("/params/name").and_then(Value::as_str))
            .flatten()
            .map(String::from);
        Some(Self {
            rpc_method,
            tool,
            batch,
        })
    }
}

/// What gets logged about one HTTP request
#[derive(Debug, Clone)]
pub struct RequestTrace {
    pub trace_id: String,
    pub method: String,
    pub path: String,
    pub session_id: Option<String>,
    started: Instant,
}

impl RequestTrace {
    pub fn new(method: &str, path: &str, session_id: Option<String>) -> Self {
        Self {
            trace_id: generate_trace_id(),
            method: method.to_string(),
            path: path.to_string(),
            session_id,
            started: Instant::now(),
        }
    }

    pub fn is_mcp(&self) -> bool {
        self.path == "/mcp"
    }

    /// Session id shortened for log lines; "new" before the handshake
    pub fn session_label(&self) -> &str {
        match self.session_id.as_deref() {
            Some(id) => id.get(..8).unwrap_or(id),
            None => "new",
        }
    }

    pub fn span(&self) -> Span {
        info_span!("http", trace_id = %self.trace_id)
    }

    pub fn log_start(&self) {
        if self.is_mcp() {
            info!(method = %self.method, session = self.session_label(), "→ {}", self.path);
        } else {
            info!(method = %self.method, "→ {}", self.path);
        }
    }

    /// JSON-RPC details of an admitted `/mcp` request
    pub fn log_call(&self, call: &McpCall) {
        info!(
            rpc = %call.rpc_method,
            tool = call.tool.as_deref().unwrap_or("-"),
            batch = call.batch,
            session = self.session_label(),
            "MCP request"
        );
    }

    pub fn log_finish(&self, status: u16) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        info!(status, elapsed_ms, "← {}", self.path);
    }
}
