//! Retention Scheduler
//!
//! Per-message auto-expiry. Each send into a channel with a non-zero
//! `auto_delete_minutes` schedules a one-shot timer; when it fires, the
//! message id is emitted on the expiry stream and the stream's owner drives
//! the soft-delete. Timers are not cancelled on manual delete: firing on an
//! already-deleted message is a cheap no-op downstream.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::domain::MessageId;

/// Delayed-expiry scheduler handle.
pub struct RetentionScheduler {
    expired_tx: mpsc::UnboundedSender<MessageId>,
    shutdown_tx: watch::Sender<bool>,
}

impl RetentionScheduler {
    /// Create a scheduler and the stream of fired expiries.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MessageId>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);
        (
            Self {
                expired_tx,
                shutdown_tx,
            },
            expired_rx,
        )
    }

    /// Schedule a one-shot expiry for a message.
    pub fn schedule(&self, message_id: MessageId, delay: Duration) {
        let tx = self.expired_tx.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tracing::debug!(message_id, delay_secs = delay.as_secs(), "Expiry scheduled");

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    // Receiver gone means the engine is shutting down; the
                    // expiry is dropped, not retried.
                    let _ = tx.send(message_id);
                }
                _ = shutdown_rx.changed() => {
                    tracing::debug!(message_id, "Expiry timer cancelled by shutdown");
                }
            }
        });
    }

    /// Cancel all pending timers.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
