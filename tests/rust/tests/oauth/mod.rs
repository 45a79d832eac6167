//! OAuth surface integration tests
//!
//! Drives `/authorize`, `/oauth/token` and the discovery documents over real HTTP.

mod flow;
mod token;

use tests::gateway::{TestGateway, OAUTH_CLIENT_ID};

pub const REDIRECT_URI: &str = "http://localhost:8976/callback";

/// HTTP client that leaves redirects to the test
pub fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Run `/authorize` and return the code from the redirect
pub async fn authorize(
    gateway: &TestGateway,
    extra: &[(&str, &str)],
) -> (String, Option<String>) {
    let mut query = vec![
        ("response_type", "code"),
        ("client_id", OAUTH_CLIENT_ID),
        ("redirect_uri", REDIRECT_URI),
    ];
    query.extend_from_slice(extra);

    let response = http()
        .get(gateway.url("/authorize"))
        .query(&query)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FOUND);

    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    let location = url::Url::parse(location).unwrap();
    assert!(location.as_str().starts_with(REDIRECT_URI));

    let param = |name: &str| {
        location
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };
    (param("code").expect("code in redirect"), param("state"))
}
