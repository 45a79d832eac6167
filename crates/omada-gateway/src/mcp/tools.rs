//! Omada tool catalog
//!
//! Every tool parses its arguments into a typed struct, issues one upstream call and renders
//! the envelope `result` as pretty-printed JSON. Action tools answer with a sentence instead.

use omada_core::endpoints::{self, Paging, StatisticsInterval};
use omada_core::{OmadaApi, OmadaError, OmadaResult};
use rmcp::model::{JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// Tools exposed to MCP clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OmadaTool {
    GetController,
    ListSites,
    GetSite,
    ListDevices,
    GetDevice,
    DeviceAction,
    ListClients,
    GetClient,
    ClientAction,
    ListWlans,
    ListLans,
    GetWan,
    ListFirewallRules,
    ListPortForwards,
    ListRoutes,
    GetStatistics,
    ListEvents,
    ListLogs,
}

impl OmadaTool {
    pub const ALL: [OmadaTool; 18] = [
        OmadaTool::GetController,
        OmadaTool::ListSites,
        OmadaTool::GetSite,
        OmadaTool::ListDevices,
        OmadaTool::GetDevice,
        OmadaTool::DeviceAction,
        OmadaTool::ListClients,
        OmadaTool::GetClient,
        OmadaTool::ClientAction,
        OmadaTool::ListWlans,
        OmadaTool::ListLans,
        OmadaTool::GetWan,
        OmadaTool::ListFirewallRules,
        OmadaTool::ListPortForwards,
        OmadaTool::ListRoutes,
        OmadaTool::GetStatistics,
        OmadaTool::ListEvents,
        OmadaTool::ListLogs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OmadaTool::GetController => "omada_get_controller",
            OmadaTool::ListSites => "omada_list_sites",
            OmadaTool::GetSite => "omada_get_site",
            OmadaTool::ListDevices => "omada_list_devices",
            OmadaTool::GetDevice => "omada_get_device",
            OmadaTool::DeviceAction => "omada_device_action",
            OmadaTool::ListClients => "omada_list_clients",
            OmadaTool::GetClient => "omada_get_client",
            OmadaTool::ClientAction => "omada_client_action",
            OmadaTool::ListWlans => "omada_list_wlans",
            OmadaTool::ListLans => "omada_list_lans",
            OmadaTool::GetWan => "omada_get_wan",
            OmadaTool::ListFirewallRules => "omada_list_firewall_rules",
            OmadaTool::ListPortForwards => "omada_list_port_forwards",
            OmadaTool::ListRoutes => "omada_list_routes",
            OmadaTool::GetStatistics => "omada_get_statistics",
            OmadaTool::ListEvents => "omada_list_events",
            OmadaTool::ListLogs => "omada_list_logs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    fn description(self) -> &'static str {
        match self {
            OmadaTool::GetController => {
                "Get Omada Controller information including version and controller ID."
            }
            OmadaTool::ListSites => "List all sites managed by the Omada Controller.",
            OmadaTool::GetSite => "Get detailed information about a specific site.",
            OmadaTool::ListDevices => {
                "List devices in a site. Can filter by type: ap, switch, gateway."
            }
            OmadaTool::GetDevice => {
                "Get detailed information about a specific device by MAC address."
            }
            OmadaTool::DeviceAction => "Perform an action on a device: reboot or adopt.",
            OmadaTool::ListClients => "List connected clients in a site.",
            OmadaTool::GetClient => {
                "Get detailed information about a specific client by MAC address."
            }
            OmadaTool::ClientAction => "Perform an action on a client: block, unblock.",
            OmadaTool::ListWlans => "List wireless networks (WLANs/SSIDs) in a site.",
            OmadaTool::ListLans => "List LAN networks in a site.",
            OmadaTool::GetWan => "Get WAN/internet settings for a site.",
            OmadaTool::ListFirewallRules => "List ACL/firewall rules for a site.",
            OmadaTool::ListPortForwards => "List port forwarding rules for a site.",
            OmadaTool::ListRoutes => "List static routes for a site.",
            OmadaTool::GetStatistics => "Get traffic statistics for a site dashboard.",
            OmadaTool::ListEvents => "List events and alerts for a site.",
            OmadaTool::ListLogs => "List system logs for a site.",
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, OmadaTool::DeviceAction | OmadaTool::ClientAction)
    }

    fn input_schema(self) -> Value {
        let site_id = json!({ "type": "string", "description": "Site ID" });
        let page = json!({ "type": "integer", "minimum": 1, "description": "Page number (default: 1)" });
        let page_size =
            json!({ "type": "integer", "minimum": 1, "description": "Items per page (default: 100)" });
        let device_mac = json!({ "type": "string", "description": "Device MAC address" });
        let client_mac = json!({ "type": "string", "description": "Client MAC address" });

        let (properties, required) = match self {
            OmadaTool::GetController => (json!({}), vec![]),
            OmadaTool::ListSites => (json!({ "page": page, "pageSize": page_size }), vec![]),
            OmadaTool::ListDevices => (
                json!({
                    "siteId": site_id,
                    "type": {
                        "type": "string",
                        "description": "Device type filter: \"ap\", \"switch\", or \"gateway\""
                    },
                    "page": page,
                    "pageSize": page_size
                }),
                vec!["siteId"],
            ),
            OmadaTool::GetDevice => (
                json!({ "siteId": site_id, "deviceMac": device_mac }),
                vec!["siteId", "deviceMac"],
            ),
            OmadaTool::DeviceAction => (
                json!({
                    "siteId": site_id,
                    "deviceMac": device_mac,
                    "action": {
                        "type": "string",
                        "enum": ["reboot", "adopt"],
                        "description": "Action to perform"
                    }
                }),
                vec!["siteId", "deviceMac", "action"],
            ),
            OmadaTool::ListClients | OmadaTool::ListEvents | OmadaTool::ListLogs => (
                json!({ "siteId": site_id, "page": page, "pageSize": page_size }),
                vec!["siteId"],
            ),
            OmadaTool::GetClient => (
                json!({ "siteId": site_id, "clientMac": client_mac }),
                vec!["siteId", "clientMac"],
            ),
            OmadaTool::ClientAction => (
                json!({
                    "siteId": site_id,
                    "clientMac": client_mac,
                    "action": {
                        "type": "string",
                        "enum": ["block", "unblock"],
                        "description": "Action to perform"
                    }
                }),
                vec!["siteId", "clientMac", "action"],
            ),
            OmadaTool::GetStatistics => (
                json!({
                    "siteId": site_id,
                    "type": {
                        "type": "string",
                        "enum": ["5min", "hourly", "daily"],
                        "description": "Statistics granularity (default: \"hourly\")"
                    }
                }),
                vec!["siteId"],
            ),
            OmadaTool::GetSite
            | OmadaTool::ListWlans
            | OmadaTool::ListLans
            | OmadaTool::GetWan
            | OmadaTool::ListFirewallRules
            | OmadaTool::ListPortForwards
            | OmadaTool::ListRoutes => (json!({ "siteId": site_id }), vec!["siteId"]),
        };

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// MCP tool definition
    pub fn definition(self) -> Option<Tool> {
        let destructive = self.is_destructive();
        let raw = json!({
            "name": self.name(),
            "description": self.description(),
            "inputSchema": self.input_schema(),
            "annotations": {
                "readOnlyHint": !destructive,
                "destructiveHint": destructive,
                "openWorldHint": true
            }
        });
        match serde_json::from_value(raw) {
            Ok(tool) => Some(tool),
            Err(e) => {
                warn!(tool = self.name(), error = %e, "Invalid tool definition");
                None
            }
        }
    }
}

/// Definitions for every tool
pub fn catalog() -> Vec<Tool> {
    OmadaTool::ALL
        .into_iter()
        .filter_map(OmadaTool::definition)
        .collect()
}

/// Argument parsing failure, reported as `invalid_params`
#[derive(Debug, thiserror::Error)]
#[error("Invalid arguments for {tool}: {source}")]
pub struct ArgumentError {
    pub tool: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// What a successful tool call produced
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Upstream `result`, rendered as pretty JSON
    Json(Value),
    /// Confirmation sentence for an action
    Message(String),
}

impl ToolOutput {
    pub fn render(&self) -> String {
        match self {
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutput::Message(text) => text.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PagingArgs {
    page: Option<u32>,
    page_size: Option<u32>,
}

impl PagingArgs {
    fn paging(&self) -> Paging {
        Paging::new(self.page, self.page_size)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteArgs {
    site_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SitePagingArgs {
    site_id: String,
    #[serde(flatten)]
    paging: PagingArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDevicesArgs {
    site_id: String,
    #[serde(rename = "type")]
    device_type: Option<String>,
    #[serde(flatten)]
    paging: PagingArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceArgs {
    site_id: String,
    device_mac: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DeviceActionKind {
    Reboot,
    Adopt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceActionArgs {
    site_id: String,
    device_mac: String,
    action: DeviceActionKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientArgs {
    site_id: String,
    client_mac: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ClientActionKind {
    Block,
    Unblock,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientActionArgs {
    site_id: String,
    client_mac: String,
    action: ClientActionKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatisticsArgs {
    site_id: String,
    #[serde(rename = "type", default)]
    interval: StatisticsInterval,
}

/// A tool invocation with validated arguments
#[derive(Debug)]
pub struct ToolCall {
    tool: OmadaTool,
    args: Value,
}

impl ToolCall {
    pub fn new(tool: OmadaTool, arguments: Option<JsonObject>) -> Self {
        Self {
            tool,
            args: Value::Object(arguments.unwrap_or_default()),
        }
    }

    pub fn tool(&self) -> OmadaTool {
        self.tool
    }

    fn parse<T: DeserializeOwned>(&self) -> Result<T, ArgumentError> {
        serde_json::from_value(self.args.clone()).map_err(|source| ArgumentError {
            tool: self.tool.name(),
            source,
        })
    }

    /// Check arguments, then run the upstream call
    ///
    /// The outer error is an argument problem; the inner result is the upstream outcome.
    pub async fn run(&self, api: &dyn OmadaApi) -> Result<OmadaResult<ToolOutput>, ArgumentError> {
        Ok(match self.tool {
            OmadaTool::GetController => controller(api).await,
            OmadaTool::ListSites => {
                let args: PagingArgs = self.parse()?;
                fetch(api, endpoints::list_sites(args.paging())).await
            }
            OmadaTool::GetSite => {
                let args: SiteArgs = self.parse()?;
                fetch(api, endpoints::get_site(&args.site_id)).await
            }
            OmadaTool::ListDevices => {
                let args: ListDevicesArgs = self.parse()?;
                let request = endpoints::list_devices(
                    &args.site_id,
                    args.device_type.as_deref(),
                    args.paging.paging(),
                );
                fetch(api, request).await
            }
            OmadaTool::GetDevice => {
                let args: DeviceArgs = self.parse()?;
                fetch(api, endpoints::get_device(&args.site_id, &args.device_mac)).await
            }
            OmadaTool::DeviceAction => {
                let args: DeviceActionArgs = self.parse()?;
                device_action(api, &args).await
            }
            OmadaTool::ListClients => {
                let args: SitePagingArgs = self.parse()?;
                fetch(api, endpoints::list_clients(&args.site_id, args.paging.paging())).await
            }
            OmadaTool::GetClient => {
                let args: ClientArgs = self.parse()?;
                fetch(api, endpoints::get_client(&args.site_id, &args.client_mac)).await
            }
            OmadaTool::ClientAction => {
                let args: ClientActionArgs = self.parse()?;
                client_action(api, &args).await
            }
            OmadaTool::ListWlans => {
                let args: SiteArgs = self.parse()?;
                fetch(api, endpoints::list_wlans(&args.site_id)).await
            }
            OmadaTool::ListLans => {
                let args: SiteArgs = self.parse()?;
                fetch(api, endpoints::list_lans(&args.site_id)).await
            }
            OmadaTool::GetWan => {
                let args: SiteArgs = self.parse()?;
                fetch(api, endpoints::get_wan(&args.site_id)).await
            }
            OmadaTool::ListFirewallRules => {
                let args: SiteArgs = self.parse()?;
                fetch(api, endpoints::list_firewall_rules(&args.site_id)).await
            }
            OmadaTool::ListPortForwards => {
                let args: SiteArgs = self.parse()?;
                fetch(api, endpoints::list_port_forwards(&args.site_id)).await
            }
            OmadaTool::ListRoutes => {
                let args: SiteArgs = self.parse()?;
                fetch(api, endpoints::list_routes(&args.site_id)).await
            }
            OmadaTool::GetStatistics => {
                let args: StatisticsArgs = self.parse()?;
                fetch(api, endpoints::get_statistics(&args.site_id, args.interval)).await
            }
            OmadaTool::ListEvents => {
                let args: SitePagingArgs = self.parse()?;
                fetch(api, endpoints::list_events(&args.site_id, args.paging.paging())).await
            }
            OmadaTool::ListLogs => {
                let args: SitePagingArgs = self.parse()?;
                fetch(api, endpoints::list_logs(&args.site_id, args.paging.paging())).await
            }
        })
    }
}

async fn controller(api: &dyn OmadaApi) -> OmadaResult<ToolOutput> {
    let info = api.controller_info().await?;
    let value = serde_json::to_value(info).map_err(|e| OmadaError::Decode(e.to_string()))?;
    Ok(ToolOutput::Json(value))
}

async fn fetch(api: &dyn OmadaApi, request: endpoints::ApiRequest) -> OmadaResult<ToolOutput> {
    api.execute(request).await.map(ToolOutput::Json)
}

async fn device_action(api: &dyn OmadaApi, args: &DeviceActionArgs) -> OmadaResult<ToolOutput> {
    let mac = &args.device_mac;
    let message = match args.action {
        DeviceActionKind::Reboot => {
            api.execute(endpoints::reboot_device(&args.site_id, mac))
                .await?;
            format!("Device {} is rebooting.", mac)
        }
        DeviceActionKind::Adopt => {
            api.execute(endpoints::adopt_device(&args.site_id, mac))
                .await?;
            format!("Device {} adoption initiated.", mac)
        }
    };
    Ok(ToolOutput::Message(message))
}

async fn client_action(api: &dyn OmadaApi, args: &ClientActionArgs) -> OmadaResult<ToolOutput> {
    let mac = &args.client_mac;
    let message = match args.action {
        ClientActionKind::Block => {
            api.execute(endpoints::block_client(&args.site_id, mac))
                .await?;
            format!("Client {} has been blocked.", mac)
        }
        ClientActionKind::Unblock => {
            api.execute(endpoints::unblock_client(&args.site_id, mac))
                .await?;
            format!("Client {} has been unblocked.", mac)
        }
    };
    Ok(ToolOutput::Message(message))
}
