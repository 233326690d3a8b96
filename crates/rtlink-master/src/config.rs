/// Minimum depth of the write/request queue.
pub const MIN_QUEUE_DEPTH: usize = 4;

/// Configuration for a [`crate::PacketMaster`].
#[derive(Debug, Clone)]
pub struct MasterConfig {
    /// Link bus word width in bits. Must be a multiple of 8, 8..=64.
    pub word_bits: usize,
    /// Depth of the write/request queue. Minimum [`MIN_QUEUE_DEPTH`].
    pub queue_depth: usize,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            word_bits: 16,
            queue_depth: MIN_QUEUE_DEPTH,
        }
    }
}
