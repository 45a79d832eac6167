//! Omada Open API client
//!
//! [`OmadaClient`] owns one credential cache:
//! - the controller identifier, resolved once through `GET /api/info`
//! - a client-credentials access token, refreshed when `now >= expires_at`
//!
//! Both are single-flight. Concurrent first callers share one discovery call, and a
//! refresh holds the token lock so waiters pick up the fresh token instead of
//! issuing their own.

pub mod endpoints;

pub use endpoints::ApiRequest;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::config::OmadaConfig;
use crate::domain::{AccessToken, ControllerInfo, Envelope, TokenGrant};
use crate::error::{OmadaError, OmadaResult};

/// Upstream operations the tool layer depends on
#[async_trait]
pub trait OmadaApi: Send + Sync {
    /// Unauthenticated controller metadata
    async fn controller_info(&self) -> OmadaResult<ControllerInfo>;

    /// Authenticated call inside the Open API namespace; returns the envelope `result`
    async fn execute(&self, request: ApiRequest) -> OmadaResult<Value>;
}

/// Authenticated Open API client
pub struct OmadaClient {
    base_url: Url,
    client_id: String,
    client_secret: Zeroizing<String>,
    timeout: Duration,
    http: reqwest::Client,
    controller_id: OnceCell<String>,
    token: Mutex<Option<AccessToken>>,
}

impl OmadaClient {
    /// Create a client with an empty credential cache
    pub fn new(config: &OmadaConfig) -> OmadaResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| OmadaError::InvalidRequest(format!("invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(OmadaError::InvalidRequest(format!(
                "invalid base URL: {}",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("omada-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OmadaError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            timeout: config.request_timeout,
            http,
            controller_id: OnceCell::new(),
            token: Mutex::new(None),
        })
    }

    /// Resolve the controller identifier, fetching it on first use
    pub async fn controller_id(&self) -> OmadaResult<&str> {
        let id = self
            .controller_id
            .get_or_try_init(|| async {
                let info = self.fetch_info().await.map_err(OmadaError::into_discovery)?;
                info!(
                    omadac_id = %info.omadac_id,
                    controller_ver = %info.controller_ver,
                    "Resolved Omada controller"
                );
                Ok::<_, OmadaError>(info.omadac_id)
            })
            .await?;
        Ok(id.as_str())
    }

    /// Make sure a valid access token is cached and return it
    pub async fn ensure_authenticated(&self) -> OmadaResult<AccessToken> {
        let controller_id = self.controller_id().await?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_valid_at(Utc::now())) {
            return Ok(token.clone());
        }

        debug!("Requesting Omada access token");
        let token = self.issue_token(controller_id).await?;
        debug!(expires_at = %token.expires_at(), "Cached Omada access token");
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Whether a non-expired token is currently cached
    pub async fn has_valid_token(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| t.is_valid_at(Utc::now()))
    }

    async fn fetch_info(&self) -> OmadaResult<ControllerInfo> {
        let url = self.url(["api", "info"])?;
        let envelope: Envelope<ControllerInfo> = self.send(self.http.get(url)).await?;
        envelope
            .into_result()?
            .ok_or_else(|| OmadaError::Decode("controller info missing from response".to_string()))
    }

    async fn issue_token(&self, controller_id: &str) -> OmadaResult<AccessToken> {
        let url = self.url([controller_id, "openapi", "authorize", "token"])?;
        let body = json!({
            "omadacId": controller_id,
            "client_id": self.client_id,
            "client_secret": self.client_secret.as_str(),
            "grant_type": "client_credentials",
        });

        let envelope: Envelope<TokenGrant> = self.send(self.http.post(url).json(&body)).await?;
        if envelope.error_code != 0 {
            warn!(code = envelope.error_code, msg = %envelope.msg, "Omada token request rejected");
            return Err(OmadaError::Authentication(envelope.msg));
        }
        let grant = envelope.result.ok_or_else(|| {
            OmadaError::Authentication("token missing from response".to_string())
        })?;

        AccessToken::from_grant(grant, Utc::now())
    }

    /// Base URL plus percent-encoded path segments
    fn url<I, S>(&self, segments: I) -> OmadaResult<Url>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| OmadaError::InvalidRequest("base URL cannot hold a path".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                let segment = segment.as_ref();
                if segment.is_empty() || segment == "." || segment == ".." {
                    return Err(OmadaError::InvalidRequest(format!(
                        "invalid path segment: {:?}",
                        segment
                    )));
                }
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> OmadaResult<Envelope<T>> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(OmadaError::Transport(format!(
                "controller responded with HTTP {}",
                status
            ))),
            Err(e) => Err(OmadaError::Decode(e.to_string())),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> OmadaError {
        if err.is_timeout() {
            OmadaError::Timeout(self.timeout)
        } else {
            OmadaError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl OmadaApi for OmadaClient {
    async fn controller_info(&self) -> OmadaResult<ControllerInfo> {
        let info = self.fetch_info().await?;
        // Seed the identifier cache; a concurrent discovery may already have filled it.
        let _ = self.controller_id.set(info.omadac_id.clone());
        Ok(info)
    }

    async fn execute(&self, request: ApiRequest) -> OmadaResult<Value> {
        let token = self.ensure_authenticated().await?;
        let controller_id = self.controller_id().await?;

        let url = self.url(
            [controller_id, "openapi", "v1", controller_id]
                .into_iter()
                .chain(request.segments.iter().map(String::as_str)),
        )?;

        debug!(method = %request.method, path = %request.path(), "→ Omada");

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(AUTHORIZATION, token.authorization_header());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let envelope: Envelope<Value> = self.send(builder).await?;
        match envelope.into_result() {
            Ok(result) => Ok(result.unwrap_or(Value::Null)),
            Err(e) => {
                warn!(method = %request.method, path = %request.path(), error = %e, "← Omada error");
                Err(e)
            }
        }
    }
}
