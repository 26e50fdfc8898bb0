//! HTTP API integration tests.
//!
//! Tests for REST API endpoints (health check, session creation and lookup,
//! one-shot location updates).

mod fixtures;
use fixtures::{TestServer, next_json, user_ids};

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: /api/health answers with status ok
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_then_get_session() {
    // テスト項目: a created session can be looked up with its creator counted
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let session_id = server.create_session("alice", 35.68, 139.76).await;

    // when (操作):
    let response = client
        .get(format!("{}/api/session/{}", server.base_url(), session_id))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["sessionId"], session_id.as_str());
    assert_eq!(body["userCount"], 1);
    assert!(body["createdAt"].as_str().unwrap().ends_with('Z'));
    assert!(body["expiresAt"].as_str().unwrap() > body["createdAt"].as_str().unwrap());
}

#[tokio::test]
async fn test_get_unknown_session_is_not_found() {
    // テスト項目: looking up a session that was never created returns 404
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/session/does-not-exist", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_create_session_rejects_invalid_body() {
    // テスト項目: malformed JSON and out-of-range coordinates are both 400
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/session", server.base_url());

    // when (操作):
    let malformed = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to send request");
    let out_of_range = client
        .post(&url)
        .json(&serde_json::json!({"userId": "alice", "latitude": 120.0, "longitude": 0.0}))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(malformed.status(), 400);
    assert_eq!(out_of_range.status(), 400);
}

#[tokio::test]
async fn test_submit_location_to_unknown_session() {
    // テスト項目: a one-shot update never creates a session
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .post(format!("{}/api/location", server.base_url()))
        .json(&serde_json::json!({
            "sessionId": "ghost",
            "userId": "alice",
            "latitude": 1.0,
            "longitude": 2.0,
        }))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 404);
    let lookup = client
        .get(format!("{}/api/session/ghost", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(lookup.status(), 404);
}

#[tokio::test]
async fn test_submit_location_updates_session_and_live_members() {
    // テスト項目: a one-shot update is stored and pushed to connected members
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let session_id = server.create_session("alice", 1.0, 2.0).await;
    let mut ws = server.connect(&session_id).await;
    assert_eq!(user_ids(&next_json(&mut ws).await), vec!["alice"]);

    // when (操作):
    let response = client
        .post(format!("{}/api/location", server.base_url()))
        .json(&serde_json::json!({
            "sessionId": session_id,
            "userId": "bob",
            "latitude": 3.0,
            "longitude": 4.0,
        }))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    assert_eq!(user_ids(&next_json(&mut ws).await), vec!["alice", "bob"]);

    let session: serde_json::Value = client
        .get(format!("{}/api/session/{}", server.base_url(), session_id))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(session["userCount"], 2);
}
