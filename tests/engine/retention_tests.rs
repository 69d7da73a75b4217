//! Message auto-expiry.

use std::time::Duration;

use community_chat::application::events::ServerEvent;
use community_chat::application::services::HistoryQuery;
use community_chat::domain::ChannelSettingsPatch;
use pretty_assertions::assert_eq;

use crate::common::{drain, settle, TestStack};

#[tokio::test(start_paused = true)]
async fn test_message_expires_after_auto_delete_window() {
    let stack = TestStack::new();
    let channel = stack.create_channel(
        "alice",
        &[],
        ChannelSettingsPatch {
            auto_delete_minutes: Some(1),
            ..Default::default()
        },
    );
    let mut alice_rx = stack.connect("alice");
    drain(&mut alice_rx);

    let message = stack.send("alice", channel.id, "ephemeral").await.unwrap();
    drain(&mut alice_rx);

    tokio::time::advance(Duration::from_secs(61)).await;
    settle().await;

    let page = stack
        .state
        .messages
        .get_history(channel.id, HistoryQuery { limit: 50, ..Default::default() })
        .await
        .unwrap();
    assert!(page.messages.is_empty(), "expired message must leave history");

    let events = drain(&mut alice_rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::MessageDeleted { message_id } if *message_id == message.id)));
}

#[tokio::test(start_paused = true)]
async fn test_manual_delete_wins_over_timer() {
    let stack = TestStack::new();
    let channel = stack.create_channel(
        "alice",
        &[],
        ChannelSettingsPatch {
            auto_delete_minutes: Some(1),
            ..Default::default()
        },
    );
    let mut alice_rx = stack.connect("alice");
    drain(&mut alice_rx);

    let message = stack.send("alice", channel.id, "going early").await.unwrap();
    stack.state.messages.delete_message("alice", message.id).await.unwrap();
    drain(&mut alice_rx);

    // The timer still fires; the expiry must be a silent no-op.
    tokio::time::advance(Duration::from_secs(61)).await;
    settle().await;

    let deletions = drain(&mut alice_rx)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::MessageDeleted { .. }))
        .count();
    assert_eq!(deletions, 0, "fired timer on a deleted message must not re-broadcast");
}

#[tokio::test(start_paused = true)]
async fn test_no_expiry_when_auto_delete_disabled() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &[], ChannelSettingsPatch::default());

    stack.send("alice", channel.id, "durable").await.unwrap();

    tokio::time::advance(Duration::from_secs(3600)).await;
    settle().await;

    let page = stack
        .state
        .messages
        .get_history(channel.id, HistoryQuery { limit: 50, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}
