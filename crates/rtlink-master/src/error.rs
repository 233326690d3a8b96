use crate::config::MIN_QUEUE_DEPTH;
use crate::entry::MAX_PAYLOAD_BYTES;

/// Errors that can occur constructing the master or its requests.
#[derive(Debug, thiserror::Error)]
pub enum MasterError {
    /// Wire-level error (invalid word size, layout problems).
    #[error("wire error: {0}")]
    Wire(#[from] rtlink_wire::WireError),

    /// The configured queue depth is below the minimum.
    #[error("queue depth {0} below minimum {MIN_QUEUE_DEPTH}")]
    QueueDepthTooSmall(usize),

    /// A write payload exceeds the maximum carried by one packet.
    #[error("payload {0} bytes exceeds maximum {MAX_PAYLOAD_BYTES}")]
    PayloadTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, MasterError>;
