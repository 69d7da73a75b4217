//! Presentation Layer
//!
//! HTTP routes/handlers and the WebSocket gateway.

pub mod http;
pub mod middleware;
pub mod websocket;
