//! Channel administration endpoint tests.

use axum_test::TestServer;
use community_chat::presentation::http::routes;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestStack;

fn server(stack: &TestStack) -> TestServer {
    TestServer::new(routes::create_router(stack.state.clone())).expect("router must build")
}

#[tokio::test]
async fn test_create_channel_returns_created() {
    let stack = TestStack::new();
    let server = server(&stack);

    let response = server
        .post("/channels")
        .json(&json!({
            "community_id": "community-1",
            "name": "general",
            "created_by": "alice",
        }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let channel: Value = response.json();
    assert_eq!(channel["community_id"], "community-1");
    assert_eq!(channel["type"], "general");
    assert!(channel["members"].as_array().unwrap().contains(&json!("alice")));
    assert!(channel["moderators"].as_array().unwrap().contains(&json!("alice")));
    assert_eq!(channel["settings"]["max_message_length"], 2000);
    assert_eq!(channel["settings"]["slow_mode_seconds"], 0);
}

#[tokio::test]
async fn test_create_channel_rejects_empty_name() {
    let stack = TestStack::new();
    let server = server(&stack);

    let response = server
        .post("/channels")
        .json(&json!({
            "community_id": "community-1",
            "name": "",
            "created_by": "alice",
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_channels_by_community() {
    let stack = TestStack::new();
    stack.create_channel("alice", &[], Default::default());
    stack.create_channel("alice", &[], Default::default());
    let server = server(&stack);

    let response = server.get("/channels/community-1").await;
    response.assert_status_ok();
    let channels: Value = response.json();
    assert_eq!(channels.as_array().unwrap().len(), 2);

    let response = server.get("/channels/community-2").await;
    response.assert_status_ok();
    let channels: Value = response.json();
    assert!(channels.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_settings_requires_permission() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &["bob"], Default::default());
    let server = server(&stack);

    let response = server
        .patch(&format!("/channels/{}/settings", channel.id))
        .json(&json!({
            "updated_by": "bob",
            "settings": { "slow_mode_seconds": 5 },
        }))
        .await;

    response.assert_status(axum::http::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_settings_unknown_channel_is_404() {
    let stack = TestStack::new();
    let server = server(&stack);

    let response = server
        .patch("/channels/12345/settings")
        .json(&json!({
            "updated_by": "alice",
            "settings": {},
        }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_online_users_snapshot() {
    let stack = TestStack::new();
    let _alice_rx = stack.connect("alice");
    stack.state.sessions.join_community("alice", "community-1");
    let server = server(&stack);

    let response = server.get("/online-users/community-1").await;
    response.assert_status_ok();
    let users: Value = response.json();
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["user_id"], "alice");
    assert_eq!(users[0]["status"], "online");
}

#[tokio::test]
async fn test_health_endpoint() {
    let stack = TestStack::new();
    let server = server(&stack);

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_prometheus_text() {
    let stack = TestStack::new();
    let server = server(&stack);

    let response = server.get("/metrics").await;
    response.assert_status_ok();
}
