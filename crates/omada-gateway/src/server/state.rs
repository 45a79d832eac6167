//! Shared router state

use axum::http::{header, HeaderMap};
use omada_core::{HttpConfig, InboundAuthConfig, OmadaApi, OmadaClient, OmadaConfig, OmadaResult};
use std::sync::Arc;

use crate::oauth::OAuthStore;
use crate::session::SessionRegistry;

/// Builds the upstream client owned by one session
pub type UpstreamFactory = Arc<dyn Fn() -> OmadaResult<Arc<dyn OmadaApi>> + Send + Sync>;

/// Factory producing a fresh [`OmadaClient`] (and credential cache) per call
pub fn omada_client_factory(config: OmadaConfig) -> UpstreamFactory {
    Arc::new(move || {
        let client = OmadaClient::new(&config)?;
        Ok(Arc::new(client) as Arc<dyn OmadaApi>)
    })
}

/// HTTP-side settings
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub inbound_auth: InboundAuthConfig,
}

/// State handed to handlers and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub oauth: Arc<OAuthStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
            oauth: Arc::new(OAuthStore::new()),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}

fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Externally visible base URL
///
/// `PUBLIC_URL` wins; otherwise scheme and host come from `X-Forwarded-Proto` /
/// `X-Forwarded-Host`, falling back to `Host`.
pub fn public_base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.config.http.public_url {
        return url.clone();
    }

    let scheme = first_value(headers, "x-forwarded-proto").unwrap_or("http");
    let host = first_value(headers, "x-forwarded-host")
        .or_else(|| first_value(headers, header::HOST.as_str()))
        .map(String::from)
        .unwrap_or_else(|| format!("localhost:{}", state.config.http.port));

    format!("{}://{}", scheme, host)
}
