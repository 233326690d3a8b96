use rtlink_sync::{notify_pair, request_pair, value_pair, NotificationSlot, Requester, ValueProbe};
use rtlink_wire::WordSize;

use crate::config::{MasterConfig, MIN_QUEUE_DEPTH};
use crate::entry::QueueRequest;
use crate::error::{MasterError, Result};
use crate::queue::{self, QueueProducer};
use crate::rx::ReceiveMachine;
use crate::tx::TransmitMachine;

/// Control-region handle to the link master.
///
/// Created together with the two link-region machines by
/// [`PacketMaster::new`]; the machines are moved into whichever threads
/// model the link-transmit and link-receive regions, and everything here
/// talks to them only through the `rtlink-sync` primitives.
///
/// The control signals (`echo`, `set_time`, `reset`) are single
/// outstanding: the `try_*` method returns `false` while a previous
/// request of the same kind has not been acknowledged. Notifications
/// (`fifo_space`, `error`) stay pending until explicitly acknowledged;
/// an event arriving while one is pending overwrites the latched value.
#[derive(Debug)]
pub struct PacketMaster {
    queue: QueueProducer,
    echo: Requester<()>,
    set_time: Requester<u64>,
    reset: Requester<bool>,
    fifo_space: NotificationSlot<u16>,
    error: NotificationSlot<u8>,
    tx_packets: ValueProbe,
    rx_packets: ValueProbe,
}

impl PacketMaster {
    /// Build the master: the control-region facade plus the transmit and
    /// receive machines for the two link regions.
    pub fn new(config: MasterConfig) -> Result<(Self, TransmitMachine, ReceiveMachine)> {
        if config.queue_depth < MIN_QUEUE_DEPTH {
            return Err(MasterError::QueueDepthTooSmall(config.queue_depth));
        }
        let word = WordSize::new(config.word_bits)?;

        let (producer, consumer) = queue::bounded(config.queue_depth);
        let (echo_req, echo_srv) = request_pair();
        let (set_time_req, set_time_srv) = request_pair();
        let (reset_req, reset_srv) = request_pair();
        let (fifo_notifier, fifo_slot) = notify_pair();
        let (error_notifier, error_slot) = notify_pair();
        let (tx_counter, tx_probe) = value_pair();
        let (rx_counter, rx_probe) = value_pair();

        let tx = TransmitMachine::new(word, consumer, echo_srv, set_time_srv, reset_srv, tx_counter)?;
        let rx = ReceiveMachine::new(word, fifo_notifier, error_notifier, rx_counter)?;

        Ok((
            Self {
                queue: producer,
                echo: echo_req,
                set_time: set_time_req,
                reset: reset_req,
                fifo_space: fifo_slot,
                error: error_slot,
                tx_packets: tx_probe,
                rx_packets: rx_probe,
            },
            tx,
            rx,
        ))
    }

    /// Whether the write/request queue can accept another entry.
    pub fn writable(&self) -> bool {
        self.queue.writable()
    }

    /// Queue a write or FIFO-space request. Returns `false` without
    /// queuing when the queue is full; check [`PacketMaster::writable`]
    /// first to avoid losing entries.
    pub fn push(&self, request: QueueRequest) -> bool {
        self.queue.try_push(request)
    }

    /// Request an echo packet. `false` if one is still in flight.
    pub fn try_echo(&self) -> bool {
        self.echo.try_request(())
    }

    /// Consume the echo acknowledgement; `true` exactly once per echo.
    pub fn echo_acked(&self) -> bool {
        self.echo.take_ack()
    }

    /// Request a set_time packet carrying `timestamp`. `false` if one is
    /// still in flight.
    pub fn try_set_time(&self, timestamp: u64) -> bool {
        self.set_time.try_request(timestamp)
    }

    /// Consume the set_time acknowledgement.
    pub fn set_time_acked(&self) -> bool {
        self.set_time.take_ack()
    }

    /// Request a reset packet; `phy` also resets the satellite PHY.
    /// `false` if one is still in flight.
    pub fn try_reset(&self, phy: bool) -> bool {
        self.reset.try_request(phy)
    }

    /// Consume the reset acknowledgement.
    pub fn reset_acked(&self) -> bool {
        self.reset.take_ack()
    }

    /// The pending FIFO-space reply, if any. Stays pending until
    /// [`PacketMaster::acknowledge_fifo_space`].
    pub fn fifo_space(&self) -> Option<u16> {
        self.fifo_space.pending()
    }

    /// Acknowledge the pending FIFO-space reply.
    pub fn acknowledge_fifo_space(&self) {
        self.fifo_space.acknowledge()
    }

    /// The pending error code, if any — remote codes verbatim plus the
    /// two local codes from [`rtlink_wire::error_code`]. Stays pending
    /// until [`PacketMaster::acknowledge_error`].
    pub fn error(&self) -> Option<u8> {
        self.error.pending()
    }

    /// Acknowledge the pending error.
    pub fn acknowledge_error(&self) {
        self.error.acknowledge()
    }

    /// Packets sent and received so far, `(tx, rx)`, sampled from the
    /// link regions. Wrapping 32-bit counts; eventually consistent.
    pub fn packet_counts(&self) -> (u32, u32) {
        (self.tx_packets.get(), self.rx_packets.get())
    }
}
