// Record ID Generator - Snowflake-like time-ordered IDs
// 64-bit ID format: [timestamp:42][node_id:10][sequence:12]

use std::sync::Mutex;

const NODE_BITS: u32 = 10;
const SEQUENCE_BITS: u32 = 12;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_MASK: u64 = (1 << 42) - 1;

#[derive(Debug)]
pub struct IdGenerator {
    node_id: u16,
    // (last timestamp in millis, next sequence within that millisecond)
    state: Mutex<(u64, u64)>,
}

impl IdGenerator {
    /// Create a generator for the given node. Node ids must fit in 10 bits.
    pub fn new(node_id: u16) -> Self {
        assert!(node_id < (1 << NODE_BITS), "Node ID must be less than 1024");
        Self {
            node_id,
            state: Mutex::new((0, 0)),
        }
    }

    /// Generate the next unique, positive, monotonically increasing ID.
    pub fn next_id(&self) -> i64 {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut now = current_millis();

        // Clock went backwards: keep issuing from the last timestamp we used.
        if now < state.0 {
            now = state.0;
        }

        if now == state.0 {
            if state.1 > MAX_SEQUENCE {
                // Sequence exhausted for this millisecond
                while now <= state.0 {
                    std::thread::yield_now();
                    now = current_millis();
                }
                *state = (now, 0);
            }
        } else {
            *state = (now, 0);
        }

        let sequence = state.1;
        state.1 += 1;

        let id = ((now & TIMESTAMP_MASK) << (NODE_BITS + SEQUENCE_BITS))
            | ((self.node_id as u64) << SEQUENCE_BITS)
            | sequence;
        id as i64
    }

    pub fn extract_node_id(id: i64) -> u16 {
        (((id as u64) >> SEQUENCE_BITS) & ((1 << NODE_BITS) - 1)) as u16
    }

    pub fn extract_timestamp(id: i64) -> u64 {
        (id as u64) >> (NODE_BITS + SEQUENCE_BITS)
    }

    pub fn extract_sequence(id: i64) -> u16 {
        ((id as u64) & MAX_SEQUENCE) as u16
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }
}

fn current_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
