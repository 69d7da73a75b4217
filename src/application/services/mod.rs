//! Engine components.
//!
//! Each component exclusively owns its slice of state: the session registry
//! owns connection liveness, the channel store owns membership and
//! permissions, the message store owns message logs. Cross-component access
//! goes through these public types, never shared maps.

pub mod channel_store;
pub mod mention_notifier;
pub mod message_store;
pub mod presence;
pub mod retention;
pub mod session_registry;

pub use channel_store::{ChannelStore, CreateChannel};
pub use mention_notifier::{MentionNotice, MentionNotifier, NotificationQueue};
pub use message_store::{HistoryPage, HistoryQuery, MessageStore, SendMessageRequest};
pub use presence::PresenceBroadcaster;
pub use retention::RetentionScheduler;
pub use session_registry::{ConnectionRef, SessionRegistry};
