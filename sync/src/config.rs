use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upper bound on headers requested in a single chunk.
    pub chunk_size: u32,
    /// How long to wait for a peer response before aborting the attempt.
    pub timeout_waiting_request: Duration,
}

impl SyncConfig {
    pub fn with_chunk_size(chunk_size: u32) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: 192,
            timeout_waiting_request: Duration::from_secs(30),
        }
    }
}
