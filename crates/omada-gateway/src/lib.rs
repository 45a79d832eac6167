//! Omada MCP Gateway
//!
//! MCP server side of the Omada bridge:
//! - Tool catalog mapping MCP calls onto Omada Open API requests
//! - stdio transport (one implicit session)
//! - Streamable HTTP transport with per-session upstream clients
//! - API key and OAuth 2.0 (authorization code + client credentials) gate on `/mcp`

pub mod auth;
pub mod logging;
pub mod mcp;
pub mod oauth;
pub mod server;
pub mod session;

pub use mcp::{serve_stdio, OmadaMcpHandler};
pub use oauth::OAuthStore;
pub use server::{omada_client_factory, AppState, GatewayConfig, GatewayServer, UpstreamFactory};
pub use session::SessionRegistry;
