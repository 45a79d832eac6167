//! Mock upstream for gateway tests
//!
//! In-memory `OmadaApi` that records every request and answers from a canned table.

use async_trait::async_trait;
use omada_core::{ApiRequest, ControllerInfo, OmadaApi, OmadaError, OmadaResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::RwLock;

// ============================================================================
// MockOmadaApi
// ============================================================================

pub struct MockOmadaApi {
    requests: RwLock<Vec<ApiRequest>>,
    responses: RwLock<HashMap<String, OmadaResult<Value>>>,
}

impl Default for MockOmadaApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOmadaApi {
    pub fn new() -> Self {
        Self {
            requests: RwLock::new(Vec::new()),
            responses: RwLock::new(HashMap::new()),
        }
    }

    /// Answer requests for `path` (e.g. `/sites`) with `result`
    pub fn respond(&self, path: &str, result: OmadaResult<Value>) {
        self.responses
            .write()
            .unwrap()
            .insert(path.to_string(), result);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.read().unwrap().clone()
    }

    pub fn request_paths(&self) -> Vec<String> {
        self.requests().iter().map(ApiRequest::path).collect()
    }
}

#[async_trait]
impl OmadaApi for MockOmadaApi {
    async fn controller_info(&self) -> OmadaResult<ControllerInfo> {
        Ok(ControllerInfo {
            omadac_id: "mock-controller".to_string(),
            controller_ver: "5.13.30".to_string(),
            api_ver: "3".to_string(),
            configured: true,
            controller_type: 1,
            support_app: true,
        })
    }

    async fn execute(&self, request: ApiRequest) -> OmadaResult<Value> {
        let path = request.path();
        self.requests.write().unwrap().push(request);

        match self.responses.read().unwrap().get(&path) {
            Some(result) => result.clone(),
            None => Ok(json!({ "data": [], "totalRows": 0 })),
        }
    }
}

/// Upstream that fails every call
pub struct OfflineOmadaApi;

#[async_trait]
impl OmadaApi for OfflineOmadaApi {
    async fn controller_info(&self) -> OmadaResult<ControllerInfo> {
        Err(OmadaError::Discovery("controller unreachable".to_string()))
    }

    async fn execute(&self, _request: ApiRequest) -> OmadaResult<Value> {
        Err(OmadaError::Discovery("controller unreachable".to_string()))
    }
}
