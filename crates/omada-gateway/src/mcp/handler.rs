//! Omada MCP handler
//!
//! One instance per protocol session. Over HTTP the instance also holds the session's lease,
//! so dropping the engine unregisters the session.

use omada_core::{OmadaApi, SERVER_NAME};
use rmcp::{
    model::*,
    service::{NotificationContext, RequestContext},
    ErrorData as McpError, RoleServer, ServerHandler,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::context::{extract_pending_session, extract_session_id};
use super::tools::{catalog, OmadaTool, ToolCall};
use crate::session::SessionLease;

/// MCP server exposing the Omada tool catalog
#[derive(Clone)]
pub struct OmadaMcpHandler {
    upstream: Arc<dyn OmadaApi>,
    lease: Option<Arc<SessionLease>>,
}

impl OmadaMcpHandler {
    /// Handler without session bookkeeping (stdio)
    pub fn new(upstream: Arc<dyn OmadaApi>) -> Self {
        Self {
            upstream,
            lease: None,
        }
    }

    /// Handler for one HTTP session
    pub fn for_session(lease: Arc<SessionLease>) -> Self {
        Self {
            upstream: lease.upstream(),
            lease: Some(lease),
        }
    }

    /// Highest protocol version both sides support
    fn negotiate_protocol_version(&self, client: &ProtocolVersion) -> ProtocolVersion {
        let ours = ProtocolVersion::LATEST;
        if client.to_string() > ours.to_string() {
            debug!(client = %client, ours = %ours, "Client uses newer protocol, negotiating down");
            ours
        } else {
            client.clone()
        }
    }
}

impl ServerHandler for OmadaMcpHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Tools for a TP-Link Omada network controller: sites, devices, clients, \
                 networks, firewall and monitoring. Site-scoped tools take a siteId from \
                 omada_list_sites."
                    .to_string(),
            ),
        }
    }

    async fn initialize(
        &self,
        params: InitializeRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        if let Some(lease) = &self.lease {
            match extract_pending_session(&context.extensions) {
                Some(pending) => {
                    if !pending.bind(lease.clone()) {
                        warn!("Session slot already bound");
                    }
                }
                None => debug!("Initialize without a pending session slot"),
            }
        }

        let protocol_version = self.negotiate_protocol_version(&params.protocol_version);
        debug!(
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol_version = %protocol_version,
            "Client initializing"
        );

        let info = self.get_info();
        Ok(InitializeResult {
            protocol_version,
            capabilities: info.capabilities,
            server_info: info.server_info,
            instructions: info.instructions,
        })
    }

    async fn on_initialized(&self, context: NotificationContext<RoleServer>) {
        let session_id = extract_session_id(&context.extensions);
        info!(session_id = ?session_id, "Client initialized");
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = catalog();
        debug!(count = tools.len(), "list_tools");
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let Some(tool) = OmadaTool::from_name(&params.name) else {
            warn!(tool = %params.name, "Unknown tool");
            return Err(McpError::invalid_params(
                format!("Unknown tool: {}", params.name),
                None,
            ));
        };

        info!(
            tool = tool.name(),
            session_id = ?extract_session_id(&context.extensions),
            "call_tool"
        );

        let call = ToolCall::new(tool, params.arguments);
        let outcome = call
            .run(self.upstream.as_ref())
            .await
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        match outcome {
            Ok(output) => {
                let text = output.render();
                debug!(tool = tool.name(), chars = text.len(), "call_tool result");
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                warn!(tool = tool.name(), error = %e, "Tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}
