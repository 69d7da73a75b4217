//! Domain entities.

pub mod channel;
pub mod message;
pub mod session;

pub use channel::{Channel, ChannelSettings, ChannelSettingsPatch, ChannelType};
pub use message::{Message, MessageType, ReactionMap};
pub use session::{PresenceStatus, Session};
