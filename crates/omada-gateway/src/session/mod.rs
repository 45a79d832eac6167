//! Session multiplexer bookkeeping for the Streamable HTTP transport
//!
//! rmcp owns the protocol engines. This module keeps the authoritative `session id → engine`
//! map the gateway routes on:
//! - a request without a session id may create a session; the engine's `initialize` binds a
//!   [`SessionLease`] to the request and the id minted by rmcp is registered from the response
//! - a request carrying an unknown id is answered with 404 and never reaches rmcp
//! - the entry disappears when the engine is dropped, on a successful `DELETE`, or when rmcp
//!   itself no longer knows the id

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use omada_core::OmadaApi;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::server::AppState;

/// Session header used by the Streamable HTTP transport
pub const SESSION_HEADER: &str = "mcp-session-id";

/// One live session
pub struct SessionEntry {
    pub opened_at: DateTime<Utc>,
}

/// Registry of live sessions
#[derive(Default)]
pub struct SessionRegistry {
    entries: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.entries.contains_key(session_id)
    }

    pub fn opened_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(session_id).map(|e| e.opened_at)
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Record the id rmcp minted for a lease
    pub fn register(&self, session_id: &str, lease: &SessionLease) {
        if lease.id.set(session_id.to_string()).is_err() {
            debug!(session_id = %session_id, "Lease already bound");
            return;
        }
        self.entries.insert(
            session_id.to_string(),
            SessionEntry {
                opened_at: Utc::now(),
            },
        );
        info!(session_id = %session_id, active = self.len(), "Session created");
    }

    /// Remove a mapping; returns whether it existed
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.entries.remove(session_id).is_some();
        if removed {
            info!(session_id = %session_id, active = self.len(), "Session closed");
        }
        removed
    }
}

/// Ties one protocol engine to its registry entry
///
/// Held by the engine; dropping the last reference removes the entry.
pub struct SessionLease {
    registry: Arc<SessionRegistry>,
    upstream: Arc<dyn OmadaApi>,
    id: OnceLock<String>,
}

impl SessionLease {
    pub fn new(registry: Arc<SessionRegistry>, upstream: Arc<dyn OmadaApi>) -> Arc<Self> {
        Arc::new(Self {
            registry,
            upstream,
            id: OnceLock::new(),
        })
    }

    pub fn upstream(&self) -> Arc<dyn OmadaApi> {
        self.upstream.clone()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if let Some(id) = self.id.get() {
            self.registry.remove(id);
        }
    }
}

/// Slot the engine fills during `initialize` for a session-less request
#[derive(Clone, Default)]
pub struct PendingSession(Arc<OnceLock<Arc<SessionLease>>>);

impl PendingSession {
    /// Returns `false` if a lease was already bound
    pub fn bind(&self, lease: Arc<SessionLease>) -> bool {
        self.0.set(lease).is_ok()
    }

    pub fn lease(&self) -> Option<&Arc<SessionLease>> {
        self.0.get()
    }
}

fn session_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Session not found" })),
    )
        .into_response()
}

/// Route `/mcp` requests by session id
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = request
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from);

    match session_id {
        Some(id) => {
            if !state.sessions.contains(&id) {
                debug!(session_id = %id, "Unknown session id");
                return session_not_found();
            }

            let is_delete = request.method() == Method::DELETE;
            let response = next.run(request).await;
            let status = response.status();

            if status == StatusCode::NOT_FOUND || status == StatusCode::UNAUTHORIZED {
                debug!(session_id = %id, "Transport no longer knows session");
                state.sessions.remove(&id);
            } else if is_delete && status.is_success() {
                state.sessions.remove(&id);
            }
            response
        }
        None => {
            let pending = PendingSession::default();
            request.extensions_mut().insert(pending.clone());
            let response = next.run(request).await;

            let minted = response
                .headers()
                .get(SESSION_HEADER)
                .and_then(|v| v.to_str().ok());
            if let (Some(id), Some(lease)) = (minted, pending.lease()) {
                state.sessions.register(id, lease);
            }
            response
        }
    }
}
