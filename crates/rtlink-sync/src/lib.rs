//! Synchronization primitives between independently-timed execution regions.
//!
//! The rtlink master splits across three regions with no shared timing
//! reference: the control region (caller threads), the link-transmit region
//! and the link-receive region. Every piece of state that crosses a region
//! boundary goes through one of the three primitives in this crate:
//!
//! - [`request_pair`] — single-outstanding request with exactly one
//!   acknowledgement per request.
//! - [`notify_pair`] — single-slot notification latch, overwritten on
//!   arrival, cleared only by explicit consumer acknowledgement.
//! - [`value_pair`] — read-only telemetry value, re-sampled at will.

pub mod notify;
pub mod request;
pub mod value;

pub use notify::{notify_pair, NotificationSlot, Notifier};
pub use request::{request_pair, Requester, Responder};
pub use value::{value_pair, ValueProbe, ValuePublisher};
