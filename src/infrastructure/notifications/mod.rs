//! Notification Queue Implementations
//!
//! The engine hands offline-mention notices to an external notification
//! service (push/email). This module provides the default implementation
//! used when no such service is wired in: notices are logged and dropped,
//! matching the at-most-once, best-effort contract.

use async_trait::async_trait;

use crate::application::services::{MentionNotice, NotificationQueue};
use crate::shared::ChatError;

/// Queue that records the hand-off in the log and drops the notice.
pub struct LogNotificationQueue;

#[async_trait]
impl NotificationQueue for LogNotificationQueue {
    async fn enqueue(&self, notice: MentionNotice) -> Result<(), ChatError> {
        tracing::info!(
            user_id = %notice.user_id,
            message_id = notice.message_id,
            channel_id = notice.channel_id,
            from_user = %notice.from_user,
            "Queued mention notification for offline delivery"
        );
        Ok(())
    }
}
