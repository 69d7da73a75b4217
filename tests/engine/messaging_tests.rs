//! Message sending, validation, slow mode, reactions and history.

use std::time::Duration;

use community_chat::application::events::ServerEvent;
use community_chat::application::services::HistoryQuery;
use community_chat::domain::ChannelSettingsPatch;
use community_chat::shared::ChatError;
use pretty_assertions::assert_eq;

use crate::common::{drain, TestStack};

#[tokio::test]
async fn test_oversized_message_is_rejected() {
    let stack = TestStack::new();
    let channel = stack.create_channel(
        "alice",
        &[],
        ChannelSettingsPatch {
            max_message_length: Some(10),
            ..Default::default()
        },
    );

    let err = stack
        .send("alice", channel.id, "01234567890") // 11 chars
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));

    // At the limit is fine.
    assert!(stack.send("alice", channel.id, "0123456789").await.is_ok());
}

#[tokio::test]
async fn test_non_member_denied_until_join_then_broadcast() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &[], ChannelSettingsPatch::default());
    let mut alice_rx = stack.connect("alice");
    let mut bob_rx = stack.connect("bob");
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    let err = stack.send("bob", channel.id, "hello?").await.unwrap_err();
    assert!(matches!(err, ChatError::PermissionDenied(_)));

    stack.state.channels.join(channel.id, "bob").unwrap();

    let message = stack.send("bob", channel.id, "hello!").await.unwrap();

    for rx in [&mut alice_rx, &mut bob_rx] {
        let events = drain(rx);
        assert!(
            events.iter().any(
                |e| matches!(e, ServerEvent::NewMessage(m) if m.id == message.id && m.content == "hello!")
            ),
            "every member connection must receive new_message"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_mode_boundary() {
    let stack = TestStack::new();
    let channel = stack.create_channel(
        "alice",
        &[],
        ChannelSettingsPatch {
            slow_mode_seconds: Some(5),
            ..Default::default()
        },
    );

    stack.send("alice", channel.id, "first").await.unwrap();

    tokio::time::advance(Duration::from_millis(4900)).await;
    let err = stack.send("alice", channel.id, "too soon").await.unwrap_err();
    assert!(matches!(err, ChatError::RateLimited));

    tokio::time::advance(Duration::from_millis(100)).await;
    stack
        .send("alice", channel.id, "exactly on time")
        .await
        .expect("a send at the full interval must succeed");
}

#[tokio::test(start_paused = true)]
async fn test_slow_mode_is_per_channel_and_per_user() {
    let stack = TestStack::new();
    let slow = ChannelSettingsPatch {
        slow_mode_seconds: Some(5),
        ..Default::default()
    };
    let first = stack.create_channel("alice", &["bob"], slow.clone());
    let second = stack.create_channel("alice", &["bob"], slow);

    stack.send("alice", first.id, "one").await.unwrap();

    // A different user in the same channel is not throttled.
    stack.send("bob", first.id, "two").await.unwrap();

    // The same user in a different channel is not throttled.
    stack.send("alice", second.id, "three").await.unwrap();

    // But the same user in the same channel is.
    let err = stack.send("alice", first.id, "four").await.unwrap_err();
    assert!(matches!(err, ChatError::RateLimited));
}

#[tokio::test]
async fn test_rejected_send_does_not_arm_slow_mode() {
    let stack = TestStack::new();
    let channel = stack.create_channel(
        "alice",
        &[],
        ChannelSettingsPatch {
            slow_mode_seconds: Some(5),
            max_message_length: Some(5),
            ..Default::default()
        },
    );

    let err = stack.send("alice", channel.id, "toolong").await.unwrap_err();
    assert!(matches!(err, ChatError::Validation(_)));

    // Only accepted messages count against the interval.
    stack.send("alice", channel.id, "ok").await.unwrap();
}

#[tokio::test]
async fn test_reaction_toggle_is_idempotent_pairwise() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &["bob"], ChannelSettingsPatch::default());
    let message = stack.send("alice", channel.id, "react to me").await.unwrap();

    let after_add = stack
        .state
        .messages
        .toggle_reaction("bob", message.id, "👍".into())
        .await
        .unwrap();
    assert_eq!(after_add["👍"].len(), 1);

    let after_remove = stack
        .state
        .messages
        .toggle_reaction("bob", message.id, "👍".into())
        .await
        .unwrap();
    assert!(after_remove.is_empty(), "add then remove must restore the original state");
}

#[tokio::test]
async fn test_reactions_disabled_channel() {
    let stack = TestStack::new();
    let channel = stack.create_channel(
        "alice",
        &[],
        ChannelSettingsPatch {
            allow_reactions: Some(false),
            ..Default::default()
        },
    );
    let message = stack.send("alice", channel.id, "no reactions").await.unwrap();

    let err = stack
        .state
        .messages
        .toggle_reaction("alice", message.id, "👍".into())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::NotFound(_)));
}

#[tokio::test]
async fn test_reaction_update_broadcasts_full_map() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &["bob"], ChannelSettingsPatch::default());
    let message = stack.send("alice", channel.id, "hi").await.unwrap();

    let mut bob_rx = stack.connect("bob");
    drain(&mut bob_rx);

    stack
        .state
        .messages
        .toggle_reaction("alice", message.id, "🎉".into())
        .await
        .unwrap();

    let events = drain(&mut bob_rx);
    let reaction_event = events
        .iter()
        .find_map(|e| match e {
            ServerEvent::ReactionUpdated {
                message_id,
                reactions,
            } if *message_id == message.id => Some(reactions.clone()),
            _ => None,
        })
        .expect("reaction_updated must be broadcast");
    assert!(reaction_event["🎉"].contains("alice"));
}

#[tokio::test]
async fn test_history_cursor_pagination_is_stable() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &[], ChannelSettingsPatch::default());

    let mut sent = Vec::new();
    for i in 0..5 {
        sent.push(stack.send("alice", channel.id, &format!("m{i}")).await.unwrap());
        // Distinct timestamps so the cursor cuts between messages.
        std::thread::sleep(Duration::from_millis(3));
    }

    // Newest first.
    let page = stack
        .state
        .messages
        .get_history(channel.id, HistoryQuery { limit: 2, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(page.messages[0].id, sent[4].id);
    assert_eq!(page.messages[1].id, sent[3].id);

    // Cursor below the newest page: nothing at or after the cursor appears.
    let cursor = sent[3].created_at;
    let older = stack
        .state
        .messages
        .get_history(
            channel.id,
            HistoryQuery {
                before: Some(cursor),
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(older.messages.iter().all(|m| m.created_at < cursor));
    assert_eq!(older.messages[0].id, sent[2].id);

    // Repeating the same cursor yields the same set.
    let repeat = stack
        .state
        .messages
        .get_history(
            channel.id,
            HistoryQuery {
                before: Some(cursor),
                limit: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: Vec<i64> = older.messages.iter().map(|m| m.id).collect();
    let repeat_ids: Vec<i64> = repeat.messages.iter().map(|m| m.id).collect();
    assert_eq!(ids, repeat_ids);
}

#[tokio::test]
async fn test_history_offset_mode() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &[], ChannelSettingsPatch::default());
    for i in 0..5 {
        stack.send("alice", channel.id, &format!("m{i}")).await.unwrap();
    }

    let page2 = stack
        .state
        .messages
        .get_history(
            channel.id,
            HistoryQuery {
                page: Some(2),
                limit: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page2.total, 5);
    assert_eq!(page2.messages.len(), 2);
    assert_eq!(page2.messages[0].content, "m2");
    assert_eq!(page2.messages[1].content, "m1");
}

#[tokio::test]
async fn test_mentions_delivered_to_online_members_only() {
    let stack = TestStack::new();
    let channel = stack.create_channel("alice", &["bob"], ChannelSettingsPatch::default());
    let mut bob_rx = stack.connect("bob");
    drain(&mut bob_rx);

    let mut request = crate::common::text_request("hey @bob and @mallory");
    request.mentions = vec!["bob".into(), "mallory".into()];
    stack
        .state
        .messages
        .send_message("alice", channel.id, request)
        .await
        .unwrap();
    crate::common::settle().await;

    let events = drain(&mut bob_rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::MentionNotification { .. })));
}

#[tokio::test]
async fn test_mentions_suppressed_when_disabled() {
    let stack = TestStack::new();
    let channel = stack.create_channel(
        "alice",
        &["bob"],
        ChannelSettingsPatch {
            allow_mentions: Some(false),
            ..Default::default()
        },
    );
    let mut bob_rx = stack.connect("bob");
    drain(&mut bob_rx);

    let mut request = crate::common::text_request("hey @bob");
    request.mentions = vec!["bob".into()];
    stack
        .state
        .messages
        .send_message("alice", channel.id, request)
        .await
        .unwrap();
    crate::common::settle().await;

    let events = drain(&mut bob_rx);
    assert!(!events
        .iter()
        .any(|e| matches!(e, ServerEvent::MentionNotification { .. })));
}
