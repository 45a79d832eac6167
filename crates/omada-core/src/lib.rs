//! # Omada Core Library
//!
//! Upstream side of the Omada MCP bridge.
//!
//! ## Modules
//!
//! - `config` - Environment-driven configuration for both transports
//! - `error` - Error taxonomy for upstream calls and configuration
//! - `domain` - Omada Open API wire types (response envelope, controller info, token grant)
//! - `client` - Authenticated Open API client with a single-flight credential cache
//!
//! ## Usage
//!
//! ```rust,ignore
//! use omada_core::{endpoints, AppConfig, OmadaApi, OmadaClient};
//!
//! let config = AppConfig::from_env()?;
//! let client = OmadaClient::new(&config.omada)?;
//!
//! let sites = client.execute(endpoints::list_sites(Default::default())).await?;
//! ```

pub mod client;
pub mod config;
pub mod domain;
pub mod error;

pub use client::{endpoints, ApiRequest, OmadaApi, OmadaClient};
pub use config::{AppConfig, HttpConfig, InboundAuthConfig, OmadaConfig};
pub use domain::{AccessToken, ControllerInfo, Envelope, TokenGrant};
pub use error::{ConfigError, OmadaError, OmadaResult};

/// Server name advertised to MCP clients
pub const SERVER_NAME: &str = "mcp-omada";
