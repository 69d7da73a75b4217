//! Message history endpoint tests.

use axum_test::TestServer;
use community_chat::domain::ChannelSettingsPatch;
use community_chat::presentation::http::routes;
use pretty_assertions::assert_eq;
use serde_json::Value;

use crate::common::TestStack;

fn server(stack: &TestStack) -> TestServer {
    TestServer::new(routes::create_router(stack.state.clone())).expect("router must build")
}

#[tokio::test]
async fn test_history_unknown_channel_is_404() {
    let stack = TestStack::new();
    let server = server(&stack);

    let response = server.get("/messages/999").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_history_returns_messages_and_pagination() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &[], ChannelSettingsPatch::default());
    for i in 0..3 {
        stack.send("alice", channel.id, &format!("m{i}")).await.unwrap();
    }
    let server = server(&stack);

    let response = server
        .get(&format!("/messages/{}", channel.id))
        .add_query_param("page", "1")
        .add_query_param("limit", "2")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "m2");
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["has_more"], true);
}

#[tokio::test]
async fn test_history_excludes_deleted_messages() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &[], ChannelSettingsPatch::default());
    let keep = stack.send("alice", channel.id, "keep").await.unwrap();
    let remove = stack.send("alice", channel.id, "remove").await.unwrap();
    stack.state.messages.delete_message("alice", remove.id).await.unwrap();
    let server = server(&stack);

    let response = server.get(&format!("/messages/{}", channel.id)).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], keep.id);
}

#[tokio::test]
async fn test_history_limit_is_clamped() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &[], ChannelSettingsPatch::default());
    stack.send("alice", channel.id, "hi").await.unwrap();
    let server = server(&stack);

    let response = server
        .get(&format!("/messages/{}", channel.id))
        .add_query_param("limit", "100000")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["pagination"]["limit"], 100);
}
