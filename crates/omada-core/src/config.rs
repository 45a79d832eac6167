//! Configuration loaded from environment variables.
//!
//! Required: `OMADA_URL`, `OMADA_CLIENT_ID`, `OMADA_CLIENT_SECRET`.
//! Everything else has a default or is optional. Empty values count as unset.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::error::ConfigError;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default deadline for every outbound controller call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upstream controller credentials and endpoint
#[derive(Clone)]
pub struct OmadaConfig {
    /// Controller base URL without trailing slash (e.g. https://omada.local:8043)
    pub base_url: String,
    /// Open API client id
    pub client_id: String,
    /// Open API client secret
    pub client_secret: Zeroizing<String>,
    /// Deadline applied to each outbound request
    pub request_timeout: Duration,
}

impl OmadaConfig {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: Zeroizing::new(client_secret.into()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for OmadaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OmadaConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// HTTP transport settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL; derived from request headers when unset
    pub public_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            public_url: None,
        }
    }
}

/// Inbound caller authentication (API key and/or OAuth client)
#[derive(Clone, Default)]
pub struct InboundAuthConfig {
    /// Static bearer key accepted on `/mcp`
    pub api_key: Option<Zeroizing<String>>,
    /// Expected OAuth client id
    pub oauth_client_id: Option<String>,
    /// Expected OAuth client secret
    pub oauth_client_secret: Option<Zeroizing<String>>,
}

impl InboundAuthConfig {
    /// No API key and no OAuth client: `/mcp` is open
    pub fn is_open(&self) -> bool {
        self.api_key.is_none() && self.oauth_client_id.is_none()
    }

    /// Both halves of the OAuth client are configured
    pub fn oauth_enabled(&self) -> bool {
        self.oauth_client_id.is_some() && self.oauth_client_secret.is_some()
    }
}

impl std::fmt::Debug for InboundAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundAuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("oauth_client_id", &self.oauth_client_id)
            .field(
                "oauth_client_secret",
                &self.oauth_client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Complete process configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub omada: OmadaConfig,
    pub http: HttpConfig,
    pub inbound_auth: InboundAuthConfig,
    /// Directory for rotated log files
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let url = get("OMADA_URL");
        let client_id = get("OMADA_CLIENT_ID");
        let client_secret = get("OMADA_CLIENT_SECRET");

        let missing: Vec<&'static str> = [
            ("OMADA_URL", url.is_none()),
            ("OMADA_CLIENT_ID", client_id.is_none()),
            ("OMADA_CLIENT_SECRET", client_secret.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(url), Some(client_id), Some(client_secret)) = (url, client_id, client_secret)
        else {
            return Err(ConfigError::Missing(missing));
        };

        validate_base_url(&url)?;

        let mut omada = OmadaConfig::new(url, client_id, client_secret);
        if let Some(raw) = get("OMADA_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_number("OMADA_REQUEST_TIMEOUT_SECS", &raw)?;
            omada = omada.with_request_timeout(Duration::from_secs(secs));
        }

        let mut http = HttpConfig::default();
        if let Some(host) = get("HOST") {
            http.host = host;
        }
        if let Some(raw) = get("PORT") {
            http.port = parse_number("PORT", &raw)?;
        }
        if let Some(public_url) = get("PUBLIC_URL") {
            validate_base_url(&public_url).map_err(|_| ConfigError::Invalid {
                name: "PUBLIC_URL",
                value: public_url.clone(),
                reason: "must be an absolute http(s) URL".to_string(),
            })?;
            http.public_url = Some(public_url.trim_end_matches('/').to_string());
        }

        let inbound_auth = InboundAuthConfig {
            api_key: get("MCP_API_KEY").map(Zeroizing::new),
            oauth_client_id: get("OAUTH_CLIENT_ID"),
            oauth_client_secret: get("OAUTH_CLIENT_SECRET").map(Zeroizing::new),
        };

        Ok(Self {
            omada,
            http,
            inbound_auth,
            log_dir: get("OMADA_MCP_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn validate_base_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        name: "OMADA_URL",
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL"));
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
