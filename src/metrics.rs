//! Observability metrics for streaming transfers.
//!
//! Tracks how the last upload or download moved bytes across the bridge:
//! totals, chunk counts, and wall time. Serialized to JSON so host layers
//! can export them without re-crossing the boundary per field.

use serde::{Deserialize, Serialize};

/// Metrics for the most recent streaming operation on a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferMetrics {
    /// Direction of the transfer ("put", "get", or "none")
    pub direction: String,

    /// Total payload bytes moved across the bridge
    pub bytes: u64,

    /// Number of read/write calls the bridge saw
    pub chunks: u64,

    /// Wall time of the transfer in microseconds
    pub duration_micros: u64,
}

impl TransferMetrics {
    pub fn new() -> Self {
        TransferMetrics {
            direction: "none".to_string(),
            bytes: 0,
            chunks: 0,
            duration_micros: 0,
        }
    }

    pub fn put(bytes: u64, chunks: u64, duration_micros: u64) -> Self {
        TransferMetrics {
            direction: "put".to_string(),
            bytes,
            chunks,
            duration_micros,
        }
    }

    pub fn get(bytes: u64, chunks: u64, duration_micros: u64) -> Self {
        TransferMetrics {
            direction: "get".to_string(),
            bytes,
            chunks,
            duration_micros,
        }
    }

    /// Mean chunk size in bytes, 0 when nothing was transferred.
    pub fn mean_chunk_size(&self) -> u64 {
        if self.chunks == 0 {
            0
        } else {
            self.bytes / self.chunks
        }
    }
}

impl Default for TransferMetrics {
    fn default() -> Self {
        Self::new()
    }
}
