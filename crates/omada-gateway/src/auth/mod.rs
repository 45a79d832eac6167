//! Bearer gate for `/mcp`
//!
//! A request passes when its bearer token is an active OAuth token or equals the static API
//! key. With neither an API key nor an OAuth client configured the gate is open.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::{debug, warn};

use crate::server::{public_base_url, AppState};

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Constant-time string comparison
fn secure_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// `client_credentials` check; the secret is compared in constant time
pub(crate) fn client_credentials_match(
    (client_id, client_secret): (&str, &str),
    given_id: Option<&str>,
    given_secret: Option<&str>,
) -> bool {
    let secret_ok = given_secret.is_some_and(|given| secure_eq(client_secret, given));
    secret_ok && given_id == Some(client_id)
}

/// Whether `token` is accepted by the current configuration
pub fn is_authorized(state: &AppState, token: Option<&str>) -> bool {
    let auth = &state.config.inbound_auth;
    if auth.is_open() {
        return true;
    }
    let Some(token) = token else {
        return false;
    };
    if state.oauth.is_token_active(token) {
        return true;
    }
    auth.api_key
        .as_ref()
        .is_some_and(|key| secure_eq(key.as_str(), token))
}

/// Axum middleware guarding the MCP endpoint
pub async fn mcp_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    if is_authorized(&state, bearer_token(request.headers())) {
        return next.run(request).await;
    }

    let has_header = request.headers().contains_key(header::AUTHORIZATION);
    if has_header {
        warn!("Rejected /mcp request: bearer token not recognised");
    } else {
        debug!("Rejected /mcp request: no Authorization header");
    }

    let metadata_url = format!(
        "{}/.well-known/oauth-protected-resource",
        public_base_url(&state, request.headers())
    );
    let challenge = format!("Bearer resource_metadata=\"{}\"", metadata_url);

    let mut response =
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
    if let Ok(value) = HeaderValue::from_str(&challenge) {
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, value);
    }
    response
}
