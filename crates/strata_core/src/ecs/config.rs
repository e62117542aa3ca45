//! World configuration

use serde::{Deserialize, Serialize};

/// How rows leave a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalPolicy {
    /// Swap the last live row into the vacated slot (keeps chunks dense).
    SwapBack,
}

/// How a destination chunk is chosen for an incoming row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkAllocationPolicy {
    /// First chunk with free capacity, scanning in chunk order.
    ScanFirstFit,
}

/// Tuning knobs for a world. All fields are floor-clamped to sane minimums
/// by [`WorldConfig::sanitized`] before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Entity record capacity reserved up front.
    pub initial_entity_capacity: usize,
    /// Rows per chunk.
    pub chunk_capacity: usize,
    /// Row removal policy.
    pub removal: RemovalPolicy,
    /// Chunk selection policy for incoming rows.
    pub chunk_allocation: ChunkAllocationPolicy,
    /// Fixed simulation rate in Hz.
    pub simulation_hz: u32,
    /// When set, buffered commands are globally key-sorted before playback so
    /// results are independent of worker count. Disabling keeps emission
    /// order and is only reproducible single-threaded.
    pub deterministic: bool,
}

impl WorldConfig {
    /// Floor-clamp every field to a workable minimum.
    pub fn sanitized(mut self) -> Self {
        self.initial_entity_capacity = self.initial_entity_capacity.max(1);
        self.chunk_capacity = self.chunk_capacity.max(4);
        self.simulation_hz = self.simulation_hz.max(1);
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_entity_capacity: 1024,
            chunk_capacity: 128,
            removal: RemovalPolicy::SwapBack,
            chunk_allocation: ChunkAllocationPolicy::ScanFirstFit,
            simulation_hz: crate::time::DEFAULT_SIMULATION_HZ,
            deterministic: true,
        }
    }
}
