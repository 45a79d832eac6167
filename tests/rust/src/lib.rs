//! Shared test utilities and fixtures for the Omada MCP integration tests.

pub use omada_core::{ApiRequest, OmadaApi, OmadaClient, OmadaConfig, OmadaError, OmadaResult};

/// Mock upstream implementations
pub mod mocks;
pub use mocks::MockOmadaApi;

/// Wiremock-backed Omada controller
pub mod controller {
    use omada_core::{OmadaClient, OmadaConfig};
    use serde_json::{json, Value};
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const CONTROLLER_ID: &str = "c0ffee00c0ffee00";
    pub const CLIENT_ID: &str = "omada-client";
    pub const CLIENT_SECRET: &str = "omada-secret";

    /// `{errorCode: 0, msg: "Success.", result}`
    pub fn ok(result: Value) -> Value {
        json!({ "errorCode": 0, "msg": "Success.", "result": result })
    }

    /// Envelope carrying a nonzero error code
    pub fn failure(code: i64, msg: &str) -> Value {
        json!({ "errorCode": code, "msg": msg })
    }

    pub fn info_body() -> Value {
        ok(json!({
            "omadacId": CONTROLLER_ID,
            "controllerVer": "5.13.30",
            "apiVer": "3",
            "configured": true,
            "type": 1,
            "supportApp": true,
        }))
    }

    pub fn token_body(access_token: &str, expires_in: i64) -> Value {
        ok(json!({
            "accessToken": access_token,
            "tokenType": "bearer",
            "expiresIn": expires_in,
            "refreshToken": "unused",
        }))
    }

    pub fn token_path() -> String {
        format!("/{}/openapi/authorize/token", CONTROLLER_ID)
    }

    /// Path of an Open API call, e.g. `api_path("sites")`
    pub fn api_path(suffix: &str) -> String {
        format!("/{0}/openapi/v1/{0}/{1}", CONTROLLER_ID, suffix)
    }

    /// `GET /api/info`, expected exactly `times` times
    pub async fn mount_info(server: &MockServer, times: u64) {
        Mock::given(method("GET"))
            .and(path("/api/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(info_body()))
            .expect(times)
            .mount(server)
            .await;
    }

    /// Token endpoint, expected exactly `times` times
    pub async fn mount_token(server: &MockServer, access_token: &str, expires_in: i64, times: u64) {
        Mock::given(method("POST"))
            .and(path(token_path()))
            .and(body_partial_json(json!({
                "omadacId": CONTROLLER_ID,
                "client_id": CLIENT_ID,
                "client_secret": CLIENT_SECRET,
                "grant_type": "client_credentials",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(token_body(access_token, expires_in)),
            )
            .expect(times)
            .mount(server)
            .await;
    }

    pub fn config(server: &MockServer) -> OmadaConfig {
        OmadaConfig::new(server.uri(), CLIENT_ID, CLIENT_SECRET)
    }

    pub fn client(server: &MockServer) -> OmadaClient {
        OmadaClient::new(&config(server)).expect("valid mock base URL")
    }

    pub fn client_with_timeout(server: &MockServer, timeout: Duration) -> OmadaClient {
        OmadaClient::new(&config(server).with_request_timeout(timeout)).expect("valid mock base URL")
    }
}

/// Gateway server on an ephemeral port
pub mod gateway {
    use crate::mocks::MockOmadaApi;
    use omada_core::{InboundAuthConfig, OmadaApi};
    use omada_gateway::{AppState, GatewayConfig, GatewayServer, UpstreamFactory};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use zeroize::Zeroizing;

    pub const API_KEY: &str = "test-api-key";
    pub const OAUTH_CLIENT_ID: &str = "mcp-client";
    pub const OAUTH_CLIENT_SECRET: &str = "mcp-client-secret";

    fn secret(value: &str) -> Zeroizing<String> {
        Zeroizing::new(value.to_string())
    }

    /// No API key and no OAuth client
    pub fn open_auth() -> InboundAuthConfig {
        InboundAuthConfig::default()
    }

    pub fn api_key_auth() -> InboundAuthConfig {
        InboundAuthConfig {
            api_key: Some(secret(API_KEY)),
            ..Default::default()
        }
    }

    pub fn oauth_auth() -> InboundAuthConfig {
        InboundAuthConfig {
            api_key: None,
            oauth_client_id: Some(OAUTH_CLIENT_ID.to_string()),
            oauth_client_secret: Some(secret(OAUTH_CLIENT_SECRET)),
        }
    }

    /// Running gateway plus handles for inspecting it
    pub struct TestGateway {
        pub base_url: String,
        pub state: AppState,
        pub upstream: Arc<MockOmadaApi>,
        /// Number of upstream clients built (one per session)
        pub clients_built: Arc<AtomicUsize>,
        shutdown: CancellationToken,
    }

    impl TestGateway {
        pub async fn start(inbound_auth: InboundAuthConfig) -> Self {
            let upstream = Arc::new(MockOmadaApi::new());
            let clients_built = Arc::new(AtomicUsize::new(0));

            let factory: UpstreamFactory = {
                let upstream = upstream.clone();
                let clients_built = clients_built.clone();
                Arc::new(move || {
                    clients_built.fetch_add(1, Ordering::SeqCst);
                    Ok(upstream.clone() as Arc<dyn OmadaApi>)
                })
            };

            let config = GatewayConfig {
                inbound_auth,
                ..Default::default()
            };
            let server = GatewayServer::new(config, factory);
            let state = server.state().clone();
            let shutdown = server.shutdown_token();

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind to random port");
            let addr = listener.local_addr().expect("local addr");
            server.spawn(listener);

            // Give server a moment to start
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;

            Self {
                base_url: format!("http://{}", addr),
                state,
                upstream,
                clients_built,
                shutdown,
            }
        }

        pub fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        pub fn mcp_url(&self) -> String {
            self.url("/mcp")
        }

        pub fn clients_built(&self) -> usize {
            self.clients_built.load(Ordering::SeqCst)
        }
    }

    impl Drop for TestGateway {
        fn drop(&mut self) {
            self.shutdown.cancel();
        }
    }
}

/// Raw MCP JSON-RPC requests for driving `/mcp` with reqwest
pub mod jsonrpc {
    use serde_json::{json, Value};

    pub const ACCEPT: &str = "application/json, text/event-stream";

    pub fn initialize(id: u64) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "raw-client", "version": "1.0.0" }
            }
        })
    }

    pub fn tools_list(id: u64) -> Value {
        json!({ "jsonrpc": "2.0", "id": id, "method": "tools/list" })
    }
}
