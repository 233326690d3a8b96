//! Master-side packet multiplexing for the rtlink real-time control bus.
//!
//! Turns a stream of high-level requests — timed channel writes,
//! FIFO-space queries, echo, set_time, reset — into a single ordered
//! packet stream on a frame-delimited word bus, and decodes the return
//! stream of replies and asynchronous notifications.
//!
//! The master spans three independently-timed regions: the control
//! region (your threads, holding a [`PacketMaster`]), the link-transmit
//! region (driving a [`TransmitMachine`] one bus cycle at a time) and
//! the link-receive region (feeding a [`ReceiveMachine`]). Writes and
//! FIFO-space queries share a strictly-ordered queue, so a space reply
//! is always meaningful relative to the writes queued before it; echo,
//! set_time and reset each ride a single-outstanding request/ack
//! handshake and are only serviced while the queue is empty.
//!
//! There is no retry, timeout or recovery at this layer: a link that
//! stops completing frames stalls the machines until something above
//! resets it.

pub mod config;
pub mod entry;
pub mod error;
pub mod master;
pub mod rx;
pub mod tx;

mod queue;

pub use config::{MasterConfig, MIN_QUEUE_DEPTH};
pub use entry::{QueueRequest, MAX_PAYLOAD_BYTES};
pub use error::{MasterError, Result};
pub use master::PacketMaster;
pub use rx::ReceiveMachine;
pub use tx::TransmitMachine;
