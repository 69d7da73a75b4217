//! Mention Notifier
//!
//! Best-effort, at-most-once delivery of mention notifications for a
//! just-stored message. Online members get a direct push; offline members
//! are handed to the external notification service through the queue seam.
//! Failures are logged and dropped, and delivery never blocks message
//! acceptance.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::events::ServerEvent;
use crate::application::services::{ChannelStore, SessionRegistry};
use crate::domain::{ChannelId, CommunityId, Message, MessageId, UserId};
use crate::shared::ChatError;

/// Maximum characters of message content included in a notification.
const SNIPPET_LEN: usize = 100;

/// Notification handed to the external delivery service for offline users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionNotice {
    pub user_id: UserId,
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub community_id: CommunityId,
    pub from_user: String,
    pub content: String,
}

/// Seam to the external notification service (push/email).
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn enqueue(&self, notice: MentionNotice) -> Result<(), ChatError>;
}

/// Extracts valid mentions from a stored message and pushes notices.
pub struct MentionNotifier {
    channels: Arc<ChannelStore>,
    sessions: Arc<SessionRegistry>,
    queue: Arc<dyn NotificationQueue>,
}

impl MentionNotifier {
    pub fn new(
        channels: Arc<ChannelStore>,
        sessions: Arc<SessionRegistry>,
        queue: Arc<dyn NotificationQueue>,
    ) -> Self {
        Self {
            channels,
            sessions,
            queue,
        }
    }

    /// Hand off a stored message for mention delivery. Returns immediately;
    /// the work runs on a spawned task.
    pub fn dispatch(&self, message: Message) {
        if message.mentions.is_empty() {
            return;
        }
        let channels = Arc::clone(&self.channels);
        let sessions = Arc::clone(&self.sessions);
        let queue = Arc::clone(&self.queue);

        tokio::spawn(async move {
            Self::deliver(channels, sessions, queue, message).await;
        });
    }

    async fn deliver(
        channels: Arc<ChannelStore>,
        sessions: Arc<SessionRegistry>,
        queue: Arc<dyn NotificationQueue>,
        message: Message,
    ) {
        let channel = match channels.get(message.channel_id) {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(message_id = message.id, error = %e, "Mention delivery skipped");
                return;
            }
        };

        let from_user = sessions
            .session(&message.user_id)
            .map(|s| s.username)
            .unwrap_or_else(|| message.user_id.clone());
        let snippet: String = message.content.chars().take(SNIPPET_LEN).collect();

        for mentioned in &message.mentions {
            // A mentioned user who is not a channel member gets nothing.
            if !channel.is_member(mentioned) {
                tracing::debug!(
                    message_id = message.id,
                    user_id = %mentioned,
                    "Mentioned user is not a channel member, skipping"
                );
                continue;
            }

            let delivered = sessions.send_to(
                mentioned,
                ServerEvent::MentionNotification {
                    message_id: message.id,
                    channel_id: message.channel_id,
                    community_id: channel.community_id.clone(),
                    from_user: from_user.clone(),
                    content: snippet.clone(),
                },
            );

            if !delivered {
                let notice = MentionNotice {
                    user_id: mentioned.clone(),
                    message_id: message.id,
                    channel_id: message.channel_id,
                    community_id: channel.community_id.clone(),
                    from_user: from_user.clone(),
                    content: snippet.clone(),
                };
                if let Err(e) = queue.enqueue(notice).await {
                    tracing::warn!(
                        message_id = message.id,
                        user_id = %mentioned,
                        error = %e,
                        "Mention queueing failed, dropping"
                    );
                }
            }
        }
    }
}
