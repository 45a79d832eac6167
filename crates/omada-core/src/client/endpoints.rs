//! Open API request descriptions
//!
//! Each builder returns an [`ApiRequest`] relative to the controller's
//! `/{omadacId}/openapi/v1/{omadacId}` namespace. Identifiers are kept as separate
//! path segments and percent-encoded when the URL is assembled.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// One authenticated call against the Open API namespace
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_paging(self, paging: Paging) -> Self {
        self.with_query("page", paging.page)
            .with_query("pageSize", paging.page_size)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Relative path for logging (`/sites/abc/devices`)
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Page selection for list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub page_size: u32,
}

impl Paging {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Dashboard statistics granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatisticsInterval {
    #[serde(rename = "5min")]
    FiveMinutes,
    #[default]
    #[serde(rename = "hourly")]
    Hourly,
    #[serde(rename = "daily")]
    Daily,
}

impl StatisticsInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticsInterval::FiveMinutes => "5min",
            StatisticsInterval::Hourly => "hourly",
            StatisticsInterval::Daily => "daily",
        }
    }
}

// Sites

pub fn list_sites(paging: Paging) -> ApiRequest {
    ApiRequest::get(["sites"]).with_paging(paging)
}

pub fn get_site(site_id: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id])
}

// Devices

pub fn list_devices(site_id: &str, device_type: Option<&str>, paging: Paging) -> ApiRequest {
    let request = ApiRequest::get(["sites", site_id, "devices"]).with_paging(paging);
    match device_type {
        Some(t) => request.with_query("type", t),
        None => request,
    }
}

pub fn get_device(site_id: &str, mac: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "devices", mac])
}

pub fn reboot_device(site_id: &str, mac: &str) -> ApiRequest {
    ApiRequest::post(["sites", site_id, "devices", mac, "reboot"])
}

pub fn adopt_device(site_id: &str, mac: &str) -> ApiRequest {
    ApiRequest::post(["sites", site_id, "cmd", "adopts"]).with_body(json!({ "macs": [mac] }))
}

// Clients

pub fn list_clients(site_id: &str, paging: Paging) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "clients"]).with_paging(paging)
}

pub fn get_client(site_id: &str, mac: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "clients", mac])
}

pub fn block_client(site_id: &str, mac: &str) -> ApiRequest {
    ApiRequest::post(["sites", site_id, "clients", mac, "block"])
}

pub fn unblock_client(site_id: &str, mac: &str) -> ApiRequest {
    ApiRequest::post(["sites", site_id, "clients", mac, "unblock"])
}

// Networks

pub fn list_wlans(site_id: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "setting", "wlans"])
}

pub fn list_lans(site_id: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "setting", "lans"])
}

pub fn get_wan(site_id: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "setting", "wan"])
}

// Security & routing

pub fn list_firewall_rules(site_id: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "setting", "firewall", "acls"])
}

pub fn list_port_forwards(site_id: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "setting", "firewall", "portForwardings"])
}

pub fn list_routes(site_id: &str) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "setting", "routes"])
}

// Monitoring

pub fn get_statistics(site_id: &str, interval: StatisticsInterval) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "dashboard", "overviewDiagram"])
        .with_query("type", interval.as_str())
}

pub fn list_events(site_id: &str, paging: Paging) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "events"]).with_paging(paging)
}

pub fn list_logs(site_id: &str, paging: Paging) -> ApiRequest {
    ApiRequest::get(["sites", site_id, "logs"]).with_paging(paging)
}
