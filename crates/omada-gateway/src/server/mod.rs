//! Gateway server
//!
//! HTTP transport: MCP over Streamable HTTP on `/mcp`, the OAuth surface and `/health`.
//! Each MCP session gets its own handler and its own upstream client.

mod handlers;
pub mod logging_middleware;
pub mod rate_limit;
mod state;

pub use handlers::{AuthorizationServerMetadata, Health, IssuedToken, ResourceMetadata};
pub use state::{omada_client_factory, public_base_url, AppState, GatewayConfig, UpstreamFactory};

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::auth::mcp_auth_middleware;
use crate::mcp::OmadaMcpHandler;
use crate::oauth::{spawn_sweeper, SWEEP_INTERVAL};
use crate::session::{session_middleware, SessionLease};

/// HTTP gateway exposing the Omada tools
pub struct GatewayServer {
    state: AppState,
    upstream: UpstreamFactory,
    shutdown: CancellationToken,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, upstream: UpstreamFactory) -> Self {
        Self::with_state(AppState::new(config), upstream)
    }

    /// Build around existing stores
    pub fn with_state(state: AppState, upstream: UpstreamFactory) -> Self {
        Self {
            state,
            upstream,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Cancelling this token stops the server, its sessions and the sweeper
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let state = self.state.clone();

        let registry = state.sessions.clone();
        let upstream = self.upstream.clone();
        let mcp_service = StreamableHttpService::new(
            move || {
                let client = upstream().map_err(|e| std::io::Error::other(e.to_string()))?;
                debug!("Creating handler instance for MCP session");
                Ok(OmadaMcpHandler::for_session(SessionLease::new(
                    registry.clone(),
                    client,
                )))
            },
            LocalSessionManager::default().into(),
            StreamableHttpServerConfig {
                stateful_mode: true,
                sse_keep_alive: Some(Duration::from_secs(30)),
                sse_retry: Some(Duration::from_secs(3)),
                cancellation_token: self.shutdown.child_token(),
            },
        );

        // Gate first, then the body is read and logged, then session routing
        let mcp_routes = Router::new()
            .nest_service("/mcp", mcp_service)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                session_middleware,
            ))
            .layer(middleware::from_fn(
                logging_middleware::mcp_call_logging_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                mcp_auth_middleware,
            ));

        let oauth_routes = Router::new()
            .route("/authorize", get(handlers::authorize))
            .route("/oauth/token", post(handlers::token))
            .layer(middleware::from_fn(rate_limit::rate_limit_middleware))
            .layer(Extension(rate_limit::RateLimiter::new()));

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(Any);

        Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/.well-known/oauth-authorization-server",
                get(handlers::authorization_server_metadata),
            )
            .route(
                "/.well-known/oauth-protected-resource",
                get(handlers::resource_metadata),
            )
            .route(
                "/.well-known/oauth-protected-resource/mcp",
                get(handlers::resource_metadata),
            )
            .merge(oauth_routes)
            .merge(mcp_routes)
            .with_state(state)
            .layer(middleware::from_fn(
                logging_middleware::http_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Bind `host:port` and serve until the shutdown token fires
    pub async fn run(self) -> Result<()> {
        let http = &self.state.config.http;
        let listener = TcpListener::bind((http.host.as_str(), http.port))
            .await
            .with_context(|| format!("failed to bind {}:{}", http.host, http.port))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr().context("listener has no local address")?;
        let auth = &self.state.config.inbound_auth;
        let auth_mode = match (auth.api_key.is_some(), auth.oauth_client_id.is_some()) {
            (false, false) => "open",
            (true, false) => "api-key",
            (false, true) => "oauth",
            (true, true) => "api-key+oauth",
        };
        if auth.is_open() {
            warn!("No MCP_API_KEY or OAUTH_CLIENT_ID configured: /mcp is unauthenticated");
        }
        if auth.oauth_client_id.is_some() && !auth.oauth_enabled() {
            warn!("OAUTH_CLIENT_ID set without OAUTH_CLIENT_SECRET: token endpoint will refuse requests");
        }

        let sweeper = spawn_sweeper(
            self.state.oauth.clone(),
            SWEEP_INTERVAL,
            self.shutdown.child_token(),
        );
        let router = self.build_router();

        info!(%addr, auth = auth_mode, "Omada MCP server (HTTP) listening");
        info!("MCP endpoint: http://{}/mcp", addr);
        info!("Health check: http://{}/health", addr);

        let shutdown = self.shutdown.clone();
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server error")?;

        self.shutdown.cancel();
        if let Err(e) = sweeper.await {
            warn!("OAuth sweeper ended abnormally: {}", e);
        }
        info!("Omada MCP server stopped");
        Ok(())
    }

    /// Start the server in the background
    pub fn spawn(self, listener: TcpListener) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.serve(listener).await })
    }
}
