//! Infrastructure Layer
//!
//! Observability and external-service seams.

pub mod metrics;
pub mod notifications;

pub use notifications::LogNotificationQueue;
