//! Credential cache: one discovery, one token per lifetime

use omada_core::{endpoints, OmadaApi};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tests::controller::{self, api_path, mount_info, mount_token, ok};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_sites(server: &MockServer, expected_token: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(api_path("sites")))
        .and(header(
            "Authorization",
            format!("AccessToken {}", expected_token).as_str(),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ok(json!({ "totalRows": 1, "data": [{ "siteId": "s1" }] }))),
        )
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_reused_across_calls() {
    let server = MockServer::start().await;
    mount_info(&server, 1).await;
    mount_token(&server, "tok-1", 7200, 1).await;
    mount_sites(&server, "tok-1", 3).await;

    let client = controller::client(&server);
    for _ in 0..3 {
        let result = client
            .execute(endpoints::list_sites(Default::default()))
            .await
            .unwrap();
        assert_eq!(result["data"][0]["siteId"], "s1");
    }
    assert!(client.has_valid_token().await);
}

#[tokio::test]
async fn test_token_inside_margin_is_refreshed() {
    // 60s lifetime minus the 60s margin: stale as soon as it is issued
    let server = MockServer::start().await;
    mount_info(&server, 1).await;
    mount_token(&server, "short", 60, 2).await;
    mount_sites(&server, "short", 2).await;

    let client = controller::client(&server);
    client
        .execute(endpoints::list_sites(Default::default()))
        .await
        .unwrap();
    client
        .execute(endpoints::list_sites(Default::default()))
        .await
        .unwrap();
    assert!(!client.has_valid_token().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_first_calls_share_discovery_and_token() {
    let server = MockServer::start().await;
    mount_info(&server, 1).await;
    mount_token(&server, "tok-1", 7200, 1).await;
    mount_sites(&server, "tok-1", 8).await;

    let client = Arc::new(controller::client(&server));
    let mut calls = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let client = client.clone();
        calls.spawn(async move {
            client
                .execute(endpoints::list_sites(Default::default()))
                .await
        });
    }
    while let Some(joined) = calls.join_next().await {
        joined.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_paging_and_identifiers_on_the_wire() {
    let server = MockServer::start().await;
    mount_info(&server, 1).await;
    mount_token(&server, "tok-1", 7200, 1).await;
    Mock::given(method("GET"))
        .and(path(api_path("sites/site%201/clients")))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({ "data": [] }))))
        .expect(1)
        .mount(&server)
        .await;

    let client = controller::client(&server);
    let paging = endpoints::Paging::new(Some(2), Some(25));
    client
        .execute(endpoints::list_clients("site 1", paging))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_controller_info_is_unauthenticated() {
    let server = MockServer::start().await;
    mount_info(&server, 1).await;
    // No token endpoint mounted: a token request would 404
    mount_token(&server, "unused", 7200, 0).await;

    let client = controller::client(&server);
    let info = client.controller_info().await.unwrap();
    assert_eq!(info.omadac_id, controller::CONTROLLER_ID);
    assert_eq!(info.controller_ver, "5.13.30");
    assert!(!client.has_valid_token().await);
}
