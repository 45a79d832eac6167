//! stdio transport: one implicit session over stdin/stdout

use anyhow::{Context, Result};
use omada_core::OmadaApi;
use rmcp::ServiceExt;
use std::sync::Arc;
use tracing::info;

use super::handler::OmadaMcpHandler;

/// Serve the tool catalog on stdin/stdout until the peer disconnects
pub async fn serve_stdio(upstream: Arc<dyn OmadaApi>) -> Result<()> {
    let service = OmadaMcpHandler::new(upstream)
        .serve(rmcp::transport::stdio())
        .await
        .context("MCP handshake on stdio failed")?;

    info!("Omada MCP server running on stdio");
    let reason = service.waiting().await.context("stdio session task failed")?;
    info!(reason = ?reason, "stdio session ended");
    Ok(())
}
