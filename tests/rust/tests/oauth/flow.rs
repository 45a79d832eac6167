//! Authorization code grant

use omada_gateway::oauth::pkce::s256_challenge;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;
use tests::gateway::{oauth_auth, TestGateway};
use tests::jsonrpc;

use super::{authorize, http, REDIRECT_URI};

const VERIFIER: &str = "dBjftJeZ4CVP-mJ92K9A3ziNy1qBQQb0vkYBhv6rpWZ";

async fn redeem(gateway: &TestGateway, form: &[(&str, &str)]) -> (StatusCode, Value) {
    let response = http()
        .post(gateway.url("/oauth/token"))
        .form(form)
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_code_flow_with_pkce() {
    let gateway = TestGateway::start(oauth_auth()).await;
    let challenge = s256_challenge(VERIFIER);

    let (code, state) = authorize(
        &gateway,
        &[
            ("state", "xyz"),
            ("code_challenge", &challenge),
            ("code_challenge_method", "S256"),
        ],
    )
    .await;
    assert_eq!(state.as_deref(), Some("xyz"));

    let (status, body) = redeem(
        &gateway,
        &[
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", REDIRECT_URI),
            ("code_verifier", VERIFIER),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    // The minted token opens /mcp
    let token = body["access_token"].as_str().unwrap();
    let response = http()
        .post(gateway.mcp_url())
        .bearer_auth(token)
        .header(reqwest::header::ACCEPT, jsonrpc::ACCEPT)
        .json(&jsonrpc::initialize(1))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_code_is_single_use() {
    let gateway = TestGateway::start(oauth_auth()).await;
    let (code, _) = authorize(&gateway, &[]).await;
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
    ];

    let (status, _) = redeem(&gateway, &form).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = redeem(&gateway, &form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_redirect_mismatch_keeps_code() {
    let gateway = TestGateway::start(oauth_auth()).await;
    let (code, _) = authorize(&gateway, &[]).await;

    let (status, body) = redeem(
        &gateway,
        &[
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", "http://evil.example/callback"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");
    assert_eq!(gateway.state.oauth.code_count(), 1);

    let (status, _) = redeem(
        &gateway,
        &[
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", REDIRECT_URI),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_verifier_rejected() {
    let gateway = TestGateway::start(oauth_auth()).await;
    let challenge = s256_challenge(VERIFIER);
    let (code, _) = authorize(&gateway, &[("code_challenge", &challenge)]).await;

    let (status, body) = redeem(
        &gateway,
        &[
            ("grant_type", "authorization_code"),
            ("code", &code),
            ("redirect_uri", REDIRECT_URI),
            ("code_verifier", "not-the-verifier"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_unknown_client_cannot_authorize() {
    let gateway = TestGateway::start(oauth_auth()).await;

    let response = http()
        .get(gateway.url("/authorize"))
        .query(&[
            ("client_id", "someone-else"),
            ("redirect_uri", REDIRECT_URI),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid_client");
    assert_eq!(gateway.state.oauth.code_count(), 0);
}

#[tokio::test]
async fn test_authorize_is_rate_limited() {
    let gateway = TestGateway::start(oauth_auth()).await;
    let client = http();

    let mut statuses = Vec::new();
    for _ in 0..31 {
        let response = client
            .get(gateway.url("/authorize"))
            .query(&[("client_id", "nobody"), ("redirect_uri", REDIRECT_URI)])
            .send()
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert!(statuses[..30].iter().all(|s| *s == StatusCode::BAD_REQUEST));
    assert_eq!(statuses[30], StatusCode::TOO_MANY_REQUESTS);

    let limited = client
        .get(gateway.url("/authorize"))
        .query(&[("client_id", "nobody"), ("redirect_uri", REDIRECT_URI)])
        .send()
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(reqwest::header::RETRY_AFTER));

    // The token endpoint has its own budget
    let token = client
        .post(gateway.url("/oauth/token"))
        .form(&[("grant_type", "password")])
        .send()
        .await
        .unwrap();
    assert_ne!(token.status(), StatusCode::TOO_MANY_REQUESTS);
}
