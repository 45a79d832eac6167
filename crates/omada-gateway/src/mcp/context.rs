//! Request-context helpers for the Streamable HTTP transport

use rmcp::model::Extensions;

use crate::session::{PendingSession, SESSION_HEADER};

/// `mcp-session-id` of the HTTP request behind an MCP message
pub fn extract_session_id(extensions: &Extensions) -> Option<String> {
    extensions
        .get::<http::request::Parts>()
        .and_then(|parts| parts.headers.get(SESSION_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Slot left by the session middleware on a session-less request
pub fn extract_pending_session(extensions: &Extensions) -> Option<PendingSession> {
    extensions
        .get::<http::request::Parts>()
        .and_then(|parts| parts.extensions.get::<PendingSession>())
        .cloned()
}
