//! Snowflake ID Generator
//!
//! Time-prefixed 64-bit ids: 41 bits of millisecond timestamp, 5 bits of
//! machine id, 5 bits of node id, 12 bits of per-millisecond sequence.
//! Ids generated by one process are strictly monotonic, so descending id
//! order equals descending creation-time order.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Custom epoch (2020-01-01T00:00:00.000Z)
const CUSTOM_EPOCH_MS: u64 = 1_577_836_800_000;

const SEQUENCE_MASK: u64 = 0xFFF;

struct ClockState {
    last_ms: u64,
    sequence: u64,
}

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    machine_id: u64,
    node_id: u64,
    state: Mutex<ClockState>,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, node_id: u64) -> Self {
        Self {
            machine_id: machine_id & 0x1F, // 5 bits
            node_id: node_id & 0x1F,       // 5 bits
            state: Mutex::new(ClockState {
                last_ms: 0,
                sequence: 0,
            }),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock();
        let mut timestamp = current_timestamp();

        // Never move backwards; a clock rollback reuses the last timestamp
        // until real time catches up.
        if timestamp < state.last_ms {
            timestamp = state.last_ms;
        }

        if timestamp == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond
                timestamp = state.last_ms + 1;
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = timestamp;

        let id = ((timestamp - CUSTOM_EPOCH_MS) << 22)
            | (self.machine_id << 17)
            | (self.node_id << 12)
            | state.sequence;

        id as i64
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(CUSTOM_EPOCH_MS)
}

/// Extract the millisecond timestamp from a snowflake ID
pub fn extract_timestamp(snowflake: i64) -> u64 {
    ((snowflake as u64) >> 22) + CUSTOM_EPOCH_MS
}
