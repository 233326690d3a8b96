use rtlink_sync::{Responder, ValuePublisher};
use rtlink_wire::{
    packets, FieldValue, LayoutRegistry, LinkWord, PacketEncoder, WordSize,
};
use tracing::debug;

use crate::entry::{prepare, PreparedEntry};
use crate::error::Result;
use crate::queue::QueueConsumer;

#[derive(Debug)]
enum TxState {
    Idle,
    Write {
        words: Vec<u64>,
        pos: usize,
        extra_words: Vec<u64>,
        extra_cnt: usize,
    },
    WriteExtra {
        extra_words: Vec<u64>,
        extra_cnt: usize,
        pos: usize,
    },
    FifoSpace {
        words: Vec<u64>,
        pos: usize,
    },
    Echo {
        words: Vec<u64>,
        pos: usize,
    },
    SetTime {
        words: Vec<u64>,
        pos: usize,
    },
    Reset {
        words: Vec<u64>,
        pos: usize,
    },
}

/// Link-transmit region state machine.
///
/// Each [`TransmitMachine::cycle`] call advances one bus cycle and
/// returns the word driven onto the link (frame low while idle). In IDLE
/// the candidate sources are polled in fixed priority order: the staged
/// queue entry first, then echo, set_time and reset — queued writes are
/// never delayed behind control traffic, which keeps FIFO-space answers
/// ordered relative to the writes before them.
#[derive(Debug)]
pub struct TransmitMachine {
    encoder: PacketEncoder,
    queue: QueueConsumer,
    read_buf: Option<PreparedEntry>,
    echo: Responder<()>,
    set_time: Responder<u64>,
    reset: Responder<bool>,
    state: TxState,
    frame_last: bool,
    packet_count: u32,
    counter: ValuePublisher,
    echo_sent: bool,
}

impl TransmitMachine {
    pub(crate) fn new(
        word: WordSize,
        queue: QueueConsumer,
        echo: Responder<()>,
        set_time: Responder<u64>,
        reset: Responder<bool>,
        counter: ValuePublisher,
    ) -> Result<Self> {
        let encoder = PacketEncoder::new(LayoutRegistry::master_to_satellite(), word);
        // Every packet this machine emits must be present in the layout
        // table; checked here so encoding cannot fail mid-stream.
        for packet in [
            packets::WRITE,
            packets::FIFO_SPACE_REQUEST,
            packets::ECHO_REQUEST,
            packets::SET_TIME,
            packets::RESET,
        ] {
            encoder.words_for(packet)?;
        }
        Ok(Self {
            encoder,
            queue,
            read_buf: None,
            echo,
            set_time,
            reset,
            state: TxState::Idle,
            frame_last: false,
            packet_count: 0,
            counter,
            echo_sent: false,
        })
    }

    /// Advance one bus cycle and return the word driven onto the link.
    pub fn cycle(&mut self) -> LinkWord {
        // Keep the read buffer primed every cycle, so the next entry is
        // already staged and prepared while the current packet is still
        // on the wire.
        if self.read_buf.is_none() {
            if let Some(request) = self.queue.try_pop() {
                self.read_buf = Some(prepare(request, self.encoder.word()));
            }
        }
        let out = self.advance();
        if out.frame && !self.frame_last {
            self.packet_count = self.packet_count.wrapping_add(1);
            self.counter.publish(self.packet_count);
        }
        self.frame_last = out.frame;
        out
    }

    /// Whether an echo request was dispatched since the last check.
    pub fn take_echo_sent(&mut self) -> bool {
        std::mem::take(&mut self.echo_sent)
    }

    fn advance(&mut self) -> LinkWord {
        match std::mem::replace(&mut self.state, TxState::Idle) {
            TxState::Idle => {
                self.arbitrate();
                LinkWord::idle()
            }
            TxState::Write {
                words,
                mut pos,
                extra_words,
                extra_cnt,
            } => {
                let data = words[pos];
                pos += 1;
                if pos < words.len() {
                    self.state = TxState::Write {
                        words,
                        pos,
                        extra_words,
                        extra_cnt,
                    };
                } else if extra_cnt > 0 {
                    self.state = TxState::WriteExtra {
                        extra_words,
                        extra_cnt,
                        pos: 0,
                    };
                }
                LinkWord::data(data)
            }
            TxState::WriteExtra {
                extra_words,
                extra_cnt,
                mut pos,
            } => {
                let data = extra_words[pos];
                pos += 1;
                if pos < extra_cnt {
                    self.state = TxState::WriteExtra {
                        extra_words,
                        extra_cnt,
                        pos,
                    };
                }
                LinkWord::data(data)
            }
            TxState::FifoSpace { words, mut pos } => {
                let data = words[pos];
                pos += 1;
                if pos < words.len() {
                    self.state = TxState::FifoSpace { words, pos };
                }
                LinkWord::data(data)
            }
            TxState::Echo { words, mut pos } => {
                let data = words[pos];
                pos += 1;
                if pos < words.len() {
                    self.state = TxState::Echo { words, pos };
                } else {
                    self.echo.complete();
                }
                LinkWord::data(data)
            }
            TxState::SetTime { words, mut pos } => {
                let data = words[pos];
                pos += 1;
                if pos < words.len() {
                    self.state = TxState::SetTime { words, pos };
                } else {
                    self.set_time.complete();
                }
                LinkWord::data(data)
            }
            TxState::Reset { words, mut pos } => {
                let data = words[pos];
                pos += 1;
                if pos < words.len() {
                    self.state = TxState::Reset { words, pos };
                } else {
                    self.reset.complete();
                }
                LinkWord::data(data)
            }
        }
    }

    /// IDLE arbitration: staged queue entry first, then the control
    /// signals in fixed priority order echo > set_time > reset.
    fn arbitrate(&mut self) {
        if let Some(entry) = self.read_buf.take() {
            if entry.request.notwrite {
                self.start_fifo_space(&entry);
            } else {
                self.start_write(entry);
            }
            return;
        }

        if self.echo.take().is_some() {
            debug!("transmitting echo request");
            self.echo_sent = true;
            self.state = TxState::Echo {
                words: self.encode(packets::ECHO_REQUEST, &[]),
                pos: 0,
            };
        } else if let Some(timestamp) = self.set_time.take() {
            debug!(timestamp, "transmitting set_time");
            self.state = TxState::SetTime {
                words: self.encode(
                    packets::SET_TIME,
                    &[("timestamp", FieldValue::Scalar(timestamp))],
                ),
                pos: 0,
            };
        } else if let Some(phy) = self.reset.take() {
            debug!(phy, "transmitting reset");
            self.state = TxState::Reset {
                words: self.encode(packets::RESET, &[("phy", FieldValue::Scalar(phy as u64))]),
                pos: 0,
            };
        }
    }

    fn start_write(&mut self, entry: PreparedEntry) {
        debug!(
            channel = entry.request.channel,
            timestamp = entry.request.timestamp,
            extra_cnt = entry.extra_cnt,
            "transmitting write"
        );
        let words = self.encode(
            packets::WRITE,
            &[
                ("timestamp", FieldValue::Scalar(entry.request.timestamp)),
                ("channel", FieldValue::Scalar(entry.request.channel as u64)),
                ("address", FieldValue::Scalar(entry.request.address as u64)),
                ("extra_data_cnt", FieldValue::Scalar(entry.extra_cnt as u64)),
                ("short_data", FieldValue::Bytes(&entry.short_data)),
            ],
        );
        self.state = TxState::Write {
            words,
            pos: 0,
            extra_words: entry.extra_words,
            extra_cnt: entry.extra_cnt,
        };
    }

    fn start_fifo_space(&mut self, entry: &PreparedEntry) {
        debug!(
            channel = entry.request.channel,
            "transmitting fifo space request"
        );
        self.state = TxState::FifoSpace {
            words: self.encode(
                packets::FIFO_SPACE_REQUEST,
                &[("channel", FieldValue::Scalar(entry.request.channel as u64))],
            ),
            pos: 0,
        };
    }

    fn encode(&self, packet: &str, fields: &[(&str, FieldValue<'_>)]) -> Vec<u64> {
        self.encoder
            .encode(packet, fields)
            .expect("layouts validated at construction")
    }
}
