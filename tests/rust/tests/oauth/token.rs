//! Client credentials grant and token endpoint errors

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::Value;
use tests::gateway::{
    api_key_auth, oauth_auth, TestGateway, OAUTH_CLIENT_ID, OAUTH_CLIENT_SECRET,
};

use super::http;

async fn post_token(gateway: &TestGateway, form: &[(&str, &str)]) -> (StatusCode, Value) {
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
async fn test_client_credentials_issues_active_token() {
    let gateway = TestGateway::start(oauth_auth()).await;

    let (status, body) = post_token(
        &gateway,
        &[
            ("grant_type", "client_credentials"),
            ("client_id", OAUTH_CLIENT_ID),
            ("client_secret", OAUTH_CLIENT_SECRET),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap();
    assert!(gateway.state.oauth.is_token_active(token));
    assert_eq!(gateway.state.oauth.token_count(), 1);
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let gateway = TestGateway::start(oauth_auth()).await;

    let (status, body) = post_token(
        &gateway,
        &[
            ("grant_type", "client_credentials"),
            ("client_id", OAUTH_CLIENT_ID),
            ("client_secret", "guess"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_client");
    assert_eq!(gateway.state.oauth.token_count(), 0);
}

#[tokio::test]
async fn test_unsupported_grant_type() {
    let gateway = TestGateway::start(oauth_auth()).await;

    let (status, body) = post_token(
        &gateway,
        &[("grant_type", "password"), ("username", "admin")],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn test_token_endpoint_without_oauth_client() {
    let gateway = TestGateway::start(api_key_auth()).await;

    let (status, body) = post_token(
        &gateway,
        &[
            ("grant_type", "client_credentials"),
            ("client_id", "x"),
            ("client_secret", "y"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "server_error");
}
