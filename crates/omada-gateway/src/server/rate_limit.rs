//! Fixed-window rate limiting for the OAuth endpoints
//!
//! Windows are tracked per (endpoint, client address). The address comes from axum's
//! `ConnectInfo`; requests without it share one window per endpoint.

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use dashmap::DashMap;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

const WINDOW: Duration = Duration::from_secs(60);

/// Windows kept before expired ones are swept
const SWEEP_THRESHOLD: usize = 10_000;

/// OAuth endpoints with their own request budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthEndpoint {
    Authorize,
    Token,
}

impl OAuthEndpoint {
    pub fn for_path(path: &str) -> Option<Self> {
        match path {
            "/authorize" => Some(Self::Authorize),
            "/oauth/token" => Some(Self::Token),
            _ => None,
        }
    }

    /// Requests allowed per window
    pub fn budget(self) -> u32 {
        match self {
            Self::Authorize => 30,
            Self::Token => 60,
        }
    }
}

#[derive(Debug)]
struct Window {
    opened: Instant,
    used: u32,
}

/// Outcome of [`RateLimiter::admit`]
#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Limited { retry_after: Duration },
}

/// Shared limiter state, installed as a request extension
#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<DashMap<(OAuthEndpoint, Option<IpAddr>), Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&self, endpoint: OAuthEndpoint, client: Option<IpAddr>) -> Admission {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep();
        }

        let now = Instant::now();
        let mut window = self.windows.entry((endpoint, client)).or_insert(Window {
            opened: now,
            used: 0,
        });

        let age = now.duration_since(window.opened);
        if age >= WINDOW {
            window.opened = now;
            window.used = 0;
        } else if window.used >= endpoint.budget() {
            return Admission::Limited {
                retry_after: WINDOW - age,
            };
        }
        window.used += 1;
        Admission::Allowed
    }

    /// Forget windows that have expired
    pub fn sweep(&self) {
        self.windows.retain(|_, w| w.opened.elapsed() < WINDOW);
    }
}

fn too_many_requests(retry_after: Duration) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "error": "rate_limited" })),
    )
        .into_response();
    let secs = retry_after.as_secs().max(1);
    if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

/// Axum middleware; a no-op unless a [`RateLimiter`] extension is present
pub async fn rate_limit_middleware(request: Request, next: Next) -> Response {
    let endpoint = OAuthEndpoint::for_path(request.uri().path());
    let limiter = request.extensions().get::<RateLimiter>();

    if let (Some(endpoint), Some(limiter)) = (endpoint, limiter) {
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        if let Admission::Limited { retry_after } = limiter.admit(endpoint, client) {
            warn!(?endpoint, client = ?client, "Rate limit exceeded");
            return too_many_requests(retry_after);
        }
    }

    next.run(request).await
}
