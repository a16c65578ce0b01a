//! Integration tests for the profile fixture served over a real socket

use axiom::fixture::serve_on;
use axiom::verify::probe_target;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn start_fixture() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(serve_on(listener));
    format!("http://{}", address)
}

#[tokio::test]
async fn test_profile_round_trip_over_http() {
    let base = start_fixture().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/profile", base))
        .bearer_auth("abc")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "user@example.com");

    let response = client
        .put(format!("{}/profile", base))
        .bearer_auth("abc")
        .json(&json!({ "email": "new@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = client
        .get(format!("{}/profile", base))
        .bearer_auth("abc")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["email"], "new@example.com");
    assert_eq!(body["account_tier"], "gold");
}

#[tokio::test]
async fn test_unauthorized_and_unknown_routes() {
    let base = start_fixture().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/profile", base))
        .bearer_auth("invalid-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Unauthorized");

    let response = client
        .get(format!("{}/missing", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "page-not-found");
}

#[tokio::test]
async fn test_probe_sees_running_fixture() {
    let base = start_fixture().await;
    assert!(probe_target(&base).await);
}
