use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

// Request lifecycle. Transitions only move forward and wrap back to IDLE,
// so each side observes every phase exactly once per request.
const IDLE: u8 = 0;
const REQUESTED: u8 = 1;
const SERVING: u8 = 2;
const ACKED: u8 = 3;

#[derive(Debug)]
struct Shared<T> {
    state: AtomicU8,
    payload: Mutex<Option<T>>,
}

/// Origin half of a single-outstanding request handshake.
///
/// At most one request may be in flight: [`Requester::try_request`] returns
/// `false` until the previous request has been served and its ack consumed
/// via [`Requester::take_ack`]. Re-asserting while in flight is not an
/// error — the attempt is simply ignored, matching the edge-triggered
/// contract of the handshake.
#[derive(Debug)]
pub struct Requester<T> {
    shared: Arc<Shared<T>>,
}

/// Destination half of a single-outstanding request handshake.
#[derive(Debug)]
pub struct Responder<T> {
    shared: Arc<Shared<T>>,
}

/// Create a connected requester/responder pair.
pub fn request_pair<T: Send>() -> (Requester<T>, Responder<T>) {
    let shared = Arc::new(Shared {
        state: AtomicU8::new(IDLE),
        payload: Mutex::new(None),
    });
    (
        Requester {
            shared: Arc::clone(&shared),
        },
        Responder { shared },
    )
}

impl<T> Requester<T> {
    /// Assert a request carrying `payload`.
    ///
    /// Returns `true` if the request was accepted, `false` if a previous
    /// request is still in flight (asserted but its ack not yet consumed).
    pub fn try_request(&self, payload: T) -> bool {
        if self.shared.state.load(Ordering::Acquire) != IDLE {
            return false;
        }
        // Payload is stored before the state becomes visible to the
        // responder; the Release store publishes it.
        *self.shared.payload.lock().expect("request payload poisoned") = Some(payload);
        self.shared.state.store(REQUESTED, Ordering::Release);
        true
    }

    /// Consume the acknowledgement for the last request.
    ///
    /// Returns `true` exactly once per served request, after which a new
    /// request may be asserted.
    pub fn take_ack(&self) -> bool {
        self.shared
            .state
            .compare_exchange(ACKED, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether a request is currently in flight.
    pub fn in_flight(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) != IDLE
    }
}

impl<T> Responder<T> {
    /// Take the pending request, if any.
    ///
    /// Returns `Some` exactly once per asserted request (pulse semantics);
    /// subsequent calls return `None` until the next request.
    pub fn take(&self) -> Option<T> {
        if self
            .shared
            .state
            .compare_exchange(REQUESTED, SERVING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        self.shared
            .payload
            .lock()
            .expect("request payload poisoned")
            .take()
    }

    /// Raise the acknowledgement for the request taken earlier.
    ///
    /// Must be called exactly once after [`Responder::take`] returned
    /// `Some`; calling it in any other phase does nothing.
    pub fn complete(&self) {
        let _ = self.shared.state.compare_exchange(
            SERVING,
            ACKED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}
