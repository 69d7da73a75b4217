//! Common Test Utilities
//!
//! Builds the full component graph in memory and provides connection and
//! channel fixtures.

#![allow(dead_code)]

use community_chat::application::events::ServerEvent;
use community_chat::application::services::{CreateChannel, SendMessageRequest};
use community_chat::config::settings::{
    CorsSettings, GatewaySettings, HistorySettings, PresenceSettings, ServerSettings, Settings,
    SnowflakeSettings,
};
use community_chat::domain::{
    Channel, ChannelId, ChannelSettingsPatch, ChannelType, Message, MessageType,
};
use community_chat::shared::ChatError;
use community_chat::startup::AppState;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Settings used by every test stack.
pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        gateway: GatewaySettings {
            max_message_size: 65536,
            authenticate_timeout_secs: 30,
        },
        snowflake: SnowflakeSettings {
            machine_id: 1,
            node_id: 0,
        },
        presence: PresenceSettings { typing_ttl_secs: 10 },
        history: HistorySettings {
            default_limit: 50,
            max_limit: 100,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        environment: "test".into(),
    }
}

/// Fully wired engine for tests. Must be created inside a Tokio runtime.
pub struct TestStack {
    pub state: AppState,
}

impl TestStack {
    pub fn new() -> Self {
        Self {
            state: AppState::build(test_settings()),
        }
    }

    /// Register a live connection for a user and return its event stream.
    pub fn connect(&self, user: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .sessions
            .authenticate(user, user, None, Uuid::new_v4(), tx);
        rx
    }

    /// Create a channel owned by `creator` with the given extra members.
    pub fn create_channel(
        &self,
        creator: &str,
        members: &[&str],
        settings: ChannelSettingsPatch,
    ) -> Channel {
        self.state.channels.create_channel(CreateChannel {
            community_id: "community-1".into(),
            name: "general".into(),
            description: None,
            channel_type: ChannelType::General,
            is_private: false,
            initial_members: members.iter().map(|m| m.to_string()).collect(),
            settings,
            created_by: creator.into(),
        })
    }

    /// Send a plain text message.
    pub async fn send(
        &self,
        user: &str,
        channel_id: ChannelId,
        content: &str,
    ) -> Result<Message, ChatError> {
        self.state
            .messages
            .send_message(user, channel_id, text_request(content))
            .await
    }
}

/// Build a plain text send request.
pub fn text_request(content: &str) -> SendMessageRequest {
    SendMessageRequest {
        content: content.into(),
        message_type: MessageType::Text,
        metadata: serde_json::Value::Null,
        reply_to: None,
        mentions: Vec::new(),
    }
}

/// Pull every event currently queued on a connection.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Let spawned engine tasks catch up (paused-clock tests included).
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}
