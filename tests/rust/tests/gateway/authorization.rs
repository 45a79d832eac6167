//! Bearer gate on /mcp

use pretty_assertions::assert_eq;
use reqwest::{header, StatusCode};
use serde_json::Value;
use tests::gateway::{api_key_auth, oauth_auth, open_auth, TestGateway, API_KEY};
use tests::jsonrpc;

use super::connect;

async fn post_initialize(gateway: &TestGateway, bearer: Option<&str>) -> reqwest::Response {
    let mut request = reqwest::Client::new()
        .post(gateway.mcp_url())
        .header(header::ACCEPT, jsonrpc::ACCEPT)
        .json(&jsonrpc::initialize(1));
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }
    request.send().await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_open_mode_needs_no_token() {
    let gateway = TestGateway::start(open_auth()).await;

    let response = post_initialize(&gateway, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("mcp-session-id"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_token_gets_challenge() {
    let gateway = TestGateway::start(api_key_auth()).await;

    let response = post_initialize(&gateway, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(
        challenge,
        format!(
            "Bearer resource_metadata=\"{}/.well-known/oauth-protected-resource\"",
            gateway.base_url
        )
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
    assert!(gateway.state.sessions.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_api_key_rejected() {
    let gateway = TestGateway::start(api_key_auth()).await;

    let response = post_initialize(&gateway, Some("not-the-key")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(gateway.clients_built(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_key_opens_session() {
    let gateway = TestGateway::start(api_key_auth()).await;

    let client = connect(&gateway.mcp_url(), Some(API_KEY)).await;
    let tools = client.list_tools(Default::default()).await.unwrap();
    assert_eq!(tools.tools.len(), 18);

    client.cancel().await.ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oauth_token_opens_session() {
    let gateway = TestGateway::start(oauth_auth()).await;
    let issued = gateway.state.oauth.issue_token();

    let client = connect(&gateway.mcp_url(), Some(&issued.access_token)).await;
    let info = client.peer_info().expect("server info after handshake");
    assert_eq!(info.server_info.name, "mcp-omada");

    client.cancel().await.ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_key_is_not_accepted_as_oauth_token() {
    let gateway = TestGateway::start(oauth_auth()).await;

    let response = post_initialize(&gateway, Some(API_KEY)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_preflight_and_health_are_not_gated() {
    let gateway = TestGateway::start(api_key_auth()).await;
    let http = reqwest::Client::new();

    let preflight = http
        .request(reqwest::Method::OPTIONS, gateway.mcp_url())
        .header(header::ORIGIN, "https://inspector.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .send()
        .await
        .unwrap();
    assert_ne!(preflight.status(), StatusCode::UNAUTHORIZED);

    let health = http.get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
