//! HTTP request/response logging middleware
//!
//! The outer layer never touches `/mcp` bodies: those are read by [`mcp_call_logging_middleware`],
//! which runs behind the bearer gate. `/mcp` responses may be long-lived SSE streams and are not
//! buffered either.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use tracing::{debug, warn, Instrument};

use crate::logging::{McpCall, RequestTrace};
use crate::session::SESSION_HEADER;

/// Largest request body accepted on the OAuth and metadata routes
pub const FORM_BODY_LIMIT: usize = 64 * 1024;

/// Largest JSON-RPC request accepted on `/mcp`
pub const MCP_BODY_LIMIT: usize = 4 * 1024 * 1024;

/// Bodies above this size are logged by length only
const BODY_PREVIEW_LIMIT: usize = 4 * 1024;

/// Fields that never reach the log, in form bodies and JSON alike
const SECRET_FIELDS: &[&str] = &[
    "client_secret",
    "code",
    "code_verifier",
    "access_token",
    "refresh_token",
];

fn is_secret(field: &str) -> bool {
    SECRET_FIELDS.contains(&field)
}

fn redact_form(text: &str) -> String {
    text.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_secret(key) => format!("{key}=***"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if is_secret(key) {
                    *field = Value::String("***".into());
                } else {
                    redact_json(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        _ => {}
    }
}

/// Debug rendering of an OAuth or metadata body with credentials masked
pub fn body_preview(bytes: &[u8]) -> String {
    if bytes.len() > BODY_PREVIEW_LIMIT {
        return format!("<{} bytes>", bytes.len());
    }
    let Ok(text) = std::str::from_utf8(bytes) else {
        return format!("<{} bytes, not utf-8>", bytes.len());
    };
    match serde_json::from_str::<Value>(text) {
        Ok(mut json) => {
            redact_json(&mut json);
            json.to_string()
        }
        Err(_) => redact_form(text),
    }
}

fn trace_for(request: &Request) -> RequestTrace {
    let session_id = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    RequestTrace::new(request.method().as_str(), request.uri().path(), session_id)
}

/// Buffer at most `limit` bytes; 413 beyond that
async fn read_limited(body: Body, limit: usize, trace: &RequestTrace) -> Result<Bytes, StatusCode> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(path = %trace.path, limit, "Request body too large");
            Err(StatusCode::PAYLOAD_TOO_LARGE)
        }
        Err(e) => {
            warn!(path = %trace.path, error = %e, "Could not read request body");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

/// Logging middleware for all routes
pub async fn http_logging_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let trace = trace_for(&request);
    let span = trace.span();

    async move {
        trace.log_start();

        if trace.is_mcp() {
            let mut request = request;
            request.extensions_mut().insert(trace.clone());
            let response = next.run(request).await;
            trace.log_finish(response.status().as_u16());
            return Ok(response);
        }

        let (parts, body) = request.into_parts();
        let bytes = match read_limited(body, FORM_BODY_LIMIT, &trace).await {
            Ok(bytes) => bytes,
            Err(status) => {
                trace.log_finish(status.as_u16());
                return Err(status);
            }
        };
        if !bytes.is_empty() {
            debug!(body = %body_preview(&bytes), "Request body");
        }

        let mut request = Request::from_parts(parts, Body::from(bytes));
        request.extensions_mut().insert(trace.clone());
        let response = next.run(request).await;

        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.map(|c| c.to_bytes()).map_err(|e| {
            warn!(path = %trace.path, error = %e, "Could not read response body");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        if !bytes.is_empty() {
            debug!(body = %body_preview(&bytes), "Response body");
        }
        trace.log_finish(parts.status.as_u16());

        Ok(Response::from_parts(parts, Body::from(bytes)))
    }
    .instrument(span)
    .await
}

/// Reads an admitted `/mcp` request body under [`MCP_BODY_LIMIT`] and logs its JSON-RPC method
pub async fn mcp_call_logging_middleware(
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let trace = match request.extensions().get::<RequestTrace>() {
        Some(trace) => trace.clone(),
        None => trace_for(&request),
    };

    let (parts, body) = request.into_parts();
    let bytes = read_limited(body, MCP_BODY_LIMIT, &trace).await?;
    if let Some(call) = McpCall::from_body(&bytes) {
        trace.log_call(&call);
    }
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
