//! # Community Chat
//!
//! Real-time chat coordination engine for community spaces:
//! - Persistent client connections over a WebSocket gateway
//! - Channels with membership, roles, and per-action permissions
//! - Server-authoritative message logs with edits, reactions, and soft delete
//! - Ephemeral presence (typing indicators, online status)
//! - Per-channel slow mode and message retention
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities and value objects
//! - **Application Layer**: Engine components and the event protocol
//! - **Infrastructure Layer**: Metrics and external-service seams
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! community_chat/
//! +-- config/        Configuration management
//! +-- domain/        Entities and value objects
//! +-- application/   Engine components and events
//! +-- infrastructure/ Metrics and notification seams
//! +-- presentation/  HTTP routes and WebSocket handlers
//! +-- shared/        Common utilities (errors, snowflake IDs)
//! ```
//!
//! ## Concurrency model
//!
//! All mutating operations on one channel's messages are linearized through
//! that channel's worker task; different channels proceed in parallel. The
//! session registry supports concurrent reads with per-key writes. Fan-out
//! to channel members never blocks the triggering operation.

// Configuration module
pub mod config;

// Domain layer - Core entities
pub mod domain;

// Application layer - Engine components
pub mod application;

// Infrastructure layer - Observability and seams
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
