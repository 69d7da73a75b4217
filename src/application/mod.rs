//! Application Layer
//!
//! The chat engine components and the event protocol they speak.

pub mod events;
pub mod services;

pub use events::{ClientEvent, ServerEvent};
