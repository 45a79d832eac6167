//! HTTP handlers for health and the OAuth surface

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::state::{public_base_url, AppState};
use crate::auth::client_credentials_match;
use crate::oauth::{OAuthError, PkceChallenge, PkceMethod};

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub sessions: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        sessions: state.sessions.len(),
    })
}

/// RFC 8414 document
#[derive(Debug, Serialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub token_endpoint_auth_methods_supported: [&'static str; 1],
    pub grant_types_supported: [&'static str; 2],
    pub response_types_supported: [&'static str; 1],
    pub code_challenge_methods_supported: [&'static str; 1],
}

impl AuthorizationServerMetadata {
    fn for_issuer(issuer: String) -> Self {
        Self {
            authorization_endpoint: format!("{issuer}/authorize"),
            token_endpoint: format!("{issuer}/oauth/token"),
            issuer,
            token_endpoint_auth_methods_supported: ["client_secret_post"],
            grant_types_supported: ["authorization_code", "client_credentials"],
            response_types_supported: ["code"],
            code_challenge_methods_supported: ["S256"],
        }
    }
}

/// `GET /.well-known/oauth-authorization-server`
pub async fn authorization_server_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<AuthorizationServerMetadata> {
    let issuer = public_base_url(&state, &headers);
    debug!(%issuer, "Serving authorization server metadata");
    Json(AuthorizationServerMetadata::for_issuer(issuer))
}

/// RFC 9728 document; `/mcp` is the only protected resource
#[derive(Debug, Serialize)]
pub struct ResourceMetadata {
    pub resource: String,
    pub authorization_servers: [String; 1],
    pub bearer_methods_supported: [&'static str; 1],
}

/// `GET /.well-known/oauth-protected-resource[/mcp]`
pub async fn resource_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ResourceMetadata> {
    let base = public_base_url(&state, &headers);
    Json(ResourceMetadata {
        resource: format!("{base}/mcp"),
        authorization_servers: [base],
        bearer_methods_supported: ["header"],
    })
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    client_id: Option<String>,
    redirect_uri: Option<String>,
    state: Option<String>,
    code_challenge: Option<String>,
    code_challenge_method: Option<String>,
    response_type: Option<String>,
}

impl AuthorizeQuery {
    fn pkce(&self) -> Result<Option<PkceChallenge>, OAuthError> {
        let Some(challenge) = self.code_challenge.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let method = PkceMethod::parse(self.code_challenge_method.as_deref())
            .ok_or(OAuthError::InvalidRequest("unsupported code_challenge_method"))?;
        Ok(Some(PkceChallenge::new(challenge, method)))
    }
}

/// `GET /authorize`
///
/// There is no consent screen. A request that names the configured client is approved on the
/// spot and redirected back with a fresh code.
pub async fn authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Response, OAuthError> {
    let configured = state.config.inbound_auth.oauth_client_id.as_deref();
    if configured.is_none() || query.client_id.as_deref() != configured {
        warn!(client_id = ?query.client_id, "Authorization request for unknown client");
        return Err(OAuthError::InvalidClient {
            unauthorized: false,
        });
    }
    if query.response_type.as_deref().is_some_and(|t| t != "code") {
        return Err(OAuthError::InvalidRequest("response_type must be 'code'"));
    }

    let raw_redirect = query
        .redirect_uri
        .as_deref()
        .ok_or(OAuthError::InvalidRequest("redirect_uri is missing or invalid"))?;
    let mut target = Url::parse(raw_redirect)
        .map_err(|_| OAuthError::InvalidRequest("redirect_uri is missing or invalid"))?;

    // The code is bound to the redirect URI exactly as sent, not the normalized form
    let code = state.oauth.issue_code(raw_redirect, query.pkce()?);

    target.query_pairs_mut().append_pair("code", &code);
    if let Some(client_state) = query.state.as_deref().filter(|s| !s.is_empty()) {
        target.query_pairs_mut().append_pair("state", client_state);
    }
    info!(redirect_host = ?target.host_str(), "Issued authorization code");

    let location = HeaderValue::from_str(target.as_str())
        .map_err(|_| OAuthError::InvalidRequest("redirect_uri is missing or invalid"))?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Form body of `POST /oauth/token`
#[derive(Debug, Deserialize)]
pub struct TokenForm {
    #[serde(default)]
    grant_type: String,
    code: Option<String>,
    redirect_uri: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    code_verifier: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// `POST /oauth/token`
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<IssuedToken>, OAuthError> {
    let auth = &state.config.inbound_auth;
    let (Some(client_id), Some(client_secret)) = (&auth.oauth_client_id, &auth.oauth_client_secret)
    else {
        warn!("Token request but no OAuth client is configured");
        return Err(OAuthError::ServerError);
    };

    if form.grant_type == "authorization_code" {
        state.oauth.redeem_code(
            form.code.as_deref().unwrap_or_default(),
            form.redirect_uri.as_deref(),
            form.code_verifier.as_deref(),
        )?;
    } else if form.grant_type == "client_credentials" {
        let matches = client_credentials_match(
            (client_id.as_str(), client_secret.as_str()),
            form.client_id.as_deref(),
            form.client_secret.as_deref(),
        );
        if !matches {
            warn!(client_id = ?form.client_id, "Client credentials rejected");
            return Err(OAuthError::InvalidClient { unauthorized: true });
        }
    } else {
        debug!(grant_type = %form.grant_type, "Unsupported grant type");
        return Err(OAuthError::UnsupportedGrantType);
    }

    let issued = state.oauth.issue_token();
    info!(
        grant_type = %form.grant_type,
        expires_in = issued.expires_in,
        "Issued access token"
    );
    Ok(Json(IssuedToken {
        access_token: issued.access_token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
    }))
}
