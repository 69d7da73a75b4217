//! Prometheus Metrics Module
//!
//! Application-wide metrics collection.
//!
//! # Metrics Collected
//! - Gateway connection and authenticated-session gauges
//! - Message operation counts (send, edit, delete, react, expire)
//! - Server event dispatch counts by event name

use once_cell::sync::Lazy;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Gateway connection gauges
pub static GATEWAY_CONNECTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new(
            "gateway_connections",
            "Number of gateway connections by state",
        )
        .namespace("community_chat"),
        &["state"], // "connected", "authenticated"
    )
    .expect("Failed to create GATEWAY_CONNECTIONS metric")
});

/// Message operation counter
pub static MESSAGE_OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("message_ops_total", "Total message operations applied")
            .namespace("community_chat"),
        &["op"], // "send", "edit", "delete", "react", "expire"
    )
    .expect("Failed to create MESSAGE_OPS_TOTAL metric")
});

/// Dispatched server event counter
pub static EVENTS_DISPATCHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "events_dispatched_total",
            "Total server events dispatched to connections",
        )
        .namespace("community_chat"),
        &["event"],
    )
    .expect("Failed to create EVENTS_DISPATCHED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(GATEWAY_CONNECTIONS.clone()))
        .expect("Failed to register GATEWAY_CONNECTIONS");
    registry
        .register(Box::new(MESSAGE_OPS_TOTAL.clone()))
        .expect("Failed to register MESSAGE_OPS_TOTAL");
    registry
        .register(Box::new(EVENTS_DISPATCHED_TOTAL.clone()))
        .expect("Failed to register EVENTS_DISPATCHED_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record an applied message operation
pub fn record_message_op(op: &str) {
    MESSAGE_OPS_TOTAL.with_label_values(&[op]).inc();
}

/// Helper to record a dispatched server event
pub fn record_event_dispatched(event: &str) {
    EVENTS_DISPATCHED_TOTAL.with_label_values(&[event]).inc();
}

/// Helper to adjust the connected-socket gauge
pub fn add_gateway_connection(delta: i64) {
    GATEWAY_CONNECTIONS
        .with_label_values(&["connected"])
        .add(delta as f64);
}

/// Helper to set the authenticated-session gauge
pub fn set_authenticated_sessions(count: i64) {
    GATEWAY_CONNECTIONS
        .with_label_values(&["authenticated"])
        .set(count as f64);
}
