use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Writer half of a cross-region telemetry value.
///
/// A gateware rendition of this link moves the value between clock
/// domains with a Gray-code transfer to rule out bit tearing; a single
/// atomic store carries the same contract here: the reader is
/// read-only, never blocks the writer, and tolerates staleness.
#[derive(Debug)]
pub struct ValuePublisher {
    shared: Arc<AtomicU32>,
}

/// Reader half of a cross-region telemetry value.
#[derive(Debug)]
pub struct ValueProbe {
    shared: Arc<AtomicU32>,
}

/// Create a connected publisher/probe pair, initialized to zero.
pub fn value_pair() -> (ValuePublisher, ValueProbe) {
    let shared = Arc::new(AtomicU32::new(0));
    (
        ValuePublisher {
            shared: Arc::clone(&shared),
        },
        ValueProbe { shared },
    )
}

impl ValuePublisher {
    /// Publish a new value.
    pub fn publish(&self, value: u32) {
        self.shared.store(value, Ordering::Release);
    }
}

impl ValueProbe {
    /// Sample the most recently published value.
    pub fn get(&self) -> u32 {
        self.shared.load(Ordering::Acquire)
    }
}
