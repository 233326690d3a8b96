//! Packet layouts and word-level encoding for the rtlink control bus.
//!
//! The link carries self-delimiting packets as a stream of bus-width words
//! under a frame-valid signal. Packet shapes are data, not code: a
//! versioned [`LayoutRegistry`] declares the fields of every packet type,
//! and the encoder/decoder pack and unpack them bit-exactly from that
//! table. Each packet starts with an 8-bit type tag; fields follow
//! LSB-first in declaration order.

pub mod bits;
pub mod bus;
pub mod decode;
pub mod encode;
pub mod error;
pub mod layout;

pub use bits::{BitReader, BitWriter};
pub use bus::{LinkWord, WordSize};
pub use decode::{PacketDecoder, PushResult};
pub use encode::{FieldValue, PacketEncoder};
pub use error::{Result, WireError};
pub use layout::{
    error_code, packets, FieldDef, LayoutRegistry, PacketLayout, MAX_PACKET_BITS,
    MAX_PAYLOAD_BITS, SHORT_DATA_BITS, TYPE_BITS,
};
