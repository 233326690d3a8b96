use rtlink_sync::{Notifier, ValuePublisher};
use rtlink_wire::{
    error_code, packets, LayoutRegistry, LinkWord, PacketDecoder, PushResult, WordSize,
};
use tracing::warn;

use crate::error::Result;

#[derive(Debug)]
enum RxState {
    /// Accumulating packet words while the frame is active.
    Input,
    /// Relaying a remote-reported error code to the consumer.
    RelayError { code: u8 },
    /// Relaying a FIFO-space reply to the consumer.
    RelayFifoSpace { space: u16 },
    /// Ignoring the remainder of a frame after an unrecognized type tag.
    DrainFrame,
}

/// Link-receive region state machine.
///
/// Fed one bus cycle at a time via [`ReceiveMachine::cycle`]. Echo
/// replies complete within INPUT; error and FIFO-space replies take one
/// relay cycle through their notification latches — the link layer
/// guarantees at least one idle cycle between frames, which covers it.
#[derive(Debug)]
pub struct ReceiveMachine {
    decoder: PacketDecoder,
    type_echo_reply: u8,
    type_fifo_space_reply: u8,
    type_error: u8,
    state: RxState,
    ongoing: bool,
    frame_last: bool,
    packet_count: u32,
    counter: ValuePublisher,
    fifo_space: Notifier<u16>,
    error: Notifier<u8>,
    echo_received: bool,
}

impl ReceiveMachine {
    pub(crate) fn new(
        word: WordSize,
        fifo_space: Notifier<u16>,
        error: Notifier<u8>,
        counter: ValuePublisher,
    ) -> Result<Self> {
        let registry = LayoutRegistry::satellite_to_master();
        let type_echo_reply = registry.get(packets::ECHO_REPLY)?.type_id;
        let type_fifo_space_reply = registry.get(packets::FIFO_SPACE_REPLY)?.type_id;
        let type_error = registry.get(packets::ERROR)?.type_id;
        Ok(Self {
            decoder: PacketDecoder::new(registry, word),
            type_echo_reply,
            type_fifo_space_reply,
            type_error,
            state: RxState::Input,
            ongoing: false,
            frame_last: false,
            packet_count: 0,
            counter,
            fifo_space,
            error,
            echo_received: false,
        })
    }

    /// Consume one bus cycle from the link.
    pub fn cycle(&mut self, word: LinkWord) {
        if word.frame && !self.frame_last {
            self.packet_count = self.packet_count.wrapping_add(1);
            self.counter.publish(self.packet_count);
        }
        self.frame_last = word.frame;

        match self.state {
            RxState::Input => self.input(word),
            RxState::RelayError { code } => {
                self.error.notify(code);
                self.state = RxState::Input;
            }
            RxState::RelayFifoSpace { space } => {
                self.fifo_space.notify(space);
                self.state = RxState::Input;
            }
            RxState::DrainFrame => {
                if !word.frame {
                    self.state = RxState::Input;
                }
            }
        }
    }

    /// Whether an echo reply arrived since the last check.
    pub fn take_echo_received(&mut self) -> bool {
        std::mem::take(&mut self.echo_received)
    }

    fn input(&mut self, word: LinkWord) {
        if word.frame {
            match self.decoder.push_word(word.data) {
                PushResult::NeedMore => self.ongoing = true,
                PushResult::UnknownType(type_id) => {
                    warn!(type_id, "unknown packet type on link");
                    self.ongoing = false;
                    self.error.notify(error_code::UNKNOWN_TYPE_LOCAL);
                    self.state = RxState::DrainFrame;
                }
                PushResult::Complete => {
                    self.ongoing = false;
                    self.dispatch();
                }
            }
        } else if self.ongoing {
            warn!("frame dropped mid-packet");
            self.ongoing = false;
            self.decoder.reset();
            self.error.notify(error_code::TRUNCATED_LOCAL);
        }
    }

    fn dispatch(&mut self) {
        let type_id = self.decoder.packet_type();
        if type_id == self.type_echo_reply {
            self.echo_received = true;
        } else if type_id == self.type_error {
            let code = self
                .decoder
                .field(packets::ERROR, "code")
                .expect("completed error packet") as u8;
            self.state = RxState::RelayError { code };
        } else if type_id == self.type_fifo_space_reply {
            let space = self
                .decoder
                .field(packets::FIFO_SPACE_REPLY, "space")
                .expect("completed fifo_space_reply packet") as u16;
            self.state = RxState::RelayFifoSpace { space };
        } else {
            // Unreachable with the built-in table: the decoder rejects
            // unregistered tags before a packet can complete.
            warn!(type_id, "completed packet with unhandled type");
            self.error.notify(error_code::UNKNOWN_TYPE_LOCAL);
        }
    }
}
