use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::trace;

#[derive(Debug)]
struct Shared<T> {
    latch: Mutex<Option<T>>,
    pending: AtomicBool,
}

/// Producer half of a single-slot notification latch.
#[derive(Debug)]
pub struct Notifier<T> {
    shared: Arc<Shared<T>>,
}

/// Consumer half of a single-slot notification latch.
///
/// The pending flag stays set until [`NotificationSlot::acknowledge`] is
/// called; the latched payload is always the most recent one.
#[derive(Debug)]
pub struct NotificationSlot<T> {
    shared: Arc<Shared<T>>,
}

/// Create a connected notifier/slot pair.
pub fn notify_pair<T: Send>() -> (Notifier<T>, NotificationSlot<T>) {
    let shared = Arc::new(Shared {
        latch: Mutex::new(None),
        pending: AtomicBool::new(false),
    });
    (
        Notifier {
            shared: Arc::clone(&shared),
        },
        NotificationSlot { shared },
    )
}

impl<T> Notifier<T> {
    /// Latch a new event payload and mark it pending.
    ///
    /// The payload is written to the latch before the pending flag is
    /// tested: an event arriving while an earlier one is still
    /// unacknowledged overwrites the data but produces no second pending
    /// cycle (the pulse is coalesced). Consumers therefore always see the
    /// freshest payload, but may observe two overlapping events as one.
    pub fn notify(&self, payload: T) {
        *self.shared.latch.lock().expect("notification latch poisoned") = Some(payload);
        if self.shared.pending.swap(true, Ordering::AcqRel) {
            trace!("notification coalesced into pending latch");
        }
    }
}

impl<T: Clone> NotificationSlot<T> {
    /// The latched payload, if an unacknowledged event is pending.
    ///
    /// Peeking does not clear the flag; call
    /// [`NotificationSlot::acknowledge`] to consume the event.
    pub fn pending(&self) -> Option<T> {
        if !self.shared.pending.load(Ordering::Acquire) {
            return None;
        }
        self.shared
            .latch
            .lock()
            .expect("notification latch poisoned")
            .clone()
    }
}

impl<T> NotificationSlot<T> {
    /// Whether an unacknowledged event is pending.
    pub fn is_pending(&self) -> bool {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Clear the pending flag, allowing the next event to be observed.
    pub fn acknowledge(&self) {
        self.shared.pending.store(false, Ordering::Release);
    }
}
