use bytes::Bytes;
use tracing::debug;

use crate::bits::{BitReader, BitWriter};
use crate::bus::WordSize;
use crate::error::{Result, WireError};
use crate::layout::{LayoutRegistry, PADDED_PACKET_BYTES};

/// Outcome of feeding one bus word to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    /// The packet needs more words.
    NeedMore,
    /// The first word carried a type tag with no registered layout. The
    /// decoder has discarded the word; the rest of the frame should be
    /// drained by the caller.
    UnknownType(u8),
    /// The packet is complete; its fields can now be read.
    Complete,
}

/// Streaming, schema-driven packet deserializer.
///
/// Words are fed one at a time as they arrive on the bus. The expected
/// packet length is learned from the type tag in the first word; once
/// [`PushResult::Complete`] is returned, fields are read by name. Feeding
/// a word after completion starts the next packet.
#[derive(Debug)]
pub struct PacketDecoder {
    registry: LayoutRegistry,
    word: WordSize,
    buf: [u8; PADDED_PACKET_BYTES],
    words: usize,
    expected: usize,
    complete: bool,
}

impl PacketDecoder {
    pub fn new(registry: LayoutRegistry, word: WordSize) -> Self {
        Self {
            registry,
            word,
            buf: [0u8; PADDED_PACKET_BYTES],
            words: 0,
            expected: 0,
            complete: false,
        }
    }

    /// Discard any partially or fully received packet.
    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.words = 0;
        self.expected = 0;
        self.complete = false;
    }

    /// Whether a packet has started but not yet completed.
    pub fn in_progress(&self) -> bool {
        self.words > 0 && !self.complete
    }

    /// Feed one bus word.
    pub fn push_word(&mut self, data: u64) -> PushResult {
        if self.complete {
            self.reset();
        }

        let data = data & self.word.mask();
        if self.words == 0 {
            let type_id = (data & 0xff) as u8;
            match self.registry.by_type(type_id) {
                Some(layout) => self.expected = layout.word_count(self.word),
                None => {
                    debug!(type_id, "unrecognized packet type tag");
                    self.reset();
                    return PushResult::UnknownType(type_id);
                }
            }
        }

        let mut writer = BitWriter::with_position(&mut self.buf, self.words * self.word.bits());
        writer.write_bits(data, self.word.bits());
        self.words += 1;

        if self.words == self.expected {
            self.complete = true;
            PushResult::Complete
        } else {
            PushResult::NeedMore
        }
    }

    /// Type tag of the current packet.
    pub fn packet_type(&self) -> u8 {
        self.buf[0]
    }

    /// Name of the completed packet.
    pub fn packet_name(&self) -> Result<&str> {
        self.check_complete()?;
        self.registry
            .by_type(self.packet_type())
            .map(|layout| layout.name.as_str())
            .ok_or_else(|| {
                WireError::UnknownPacket(format!("type {:#04x}", self.packet_type()))
            })
    }

    /// Read a scalar field (at most 64 bits wide) of the completed packet.
    pub fn field(&self, packet: &str, field: &str) -> Result<u64> {
        let (offset, width) = self.locate(packet, field)?;
        if width > 64 {
            return Err(WireError::FieldTooWide {
                field: field.to_string(),
                width,
            });
        }
        let mut reader = BitReader::new(&self.buf);
        reader.seek(offset);
        Ok(reader.read_bits(width))
    }

    /// Read a field of the completed packet as bytes, LSB-first.
    pub fn field_bytes(&self, packet: &str, field: &str) -> Result<Bytes> {
        let (offset, width) = self.locate(packet, field)?;
        let mut reader = BitReader::new(&self.buf);
        reader.seek(offset);
        Ok(Bytes::from(reader.read_to_vec(width)))
    }

    fn locate(&self, packet: &str, field: &str) -> Result<(usize, usize)> {
        self.check_complete()?;
        let layout = self.registry.get(packet)?;
        let offset = layout
            .field_offset(field)
            .ok_or_else(|| WireError::UnknownField {
                packet: packet.to_string(),
                field: field.to_string(),
            })?;
        let width = layout.field_width(field).unwrap_or_default();
        Ok((offset, width))
    }

    fn check_complete(&self) -> Result<()> {
        if !self.complete {
            return Err(WireError::Incomplete {
                got: self.words,
                expected: self.expected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{FieldValue, PacketEncoder};
    use crate::layout::{packets, FieldDef, PacketLayout, MAX_PACKET_BITS};

    fn pair(bits: usize) -> (PacketEncoder, PacketDecoder) {
        let word = WordSize::new(bits).unwrap();
        (
            PacketEncoder::new(LayoutRegistry::satellite_to_master(), word),
            PacketDecoder::new(LayoutRegistry::satellite_to_master(), word),
        )
    }

    #[test]
    fn streams_words_until_complete() {
        let (enc, mut dec) = pair(8);
        let words = enc
            .encode(packets::FIFO_SPACE_REPLY, &[("space", FieldValue::Scalar(0xBEEF))])
            .unwrap();
        assert_eq!(words.len(), 3);

        assert_eq!(dec.push_word(words[0]), PushResult::NeedMore);
        assert!(dec.in_progress());
        assert!(dec.field(packets::FIFO_SPACE_REPLY, "space").is_err());
        assert_eq!(dec.push_word(words[1]), PushResult::NeedMore);
        assert_eq!(dec.push_word(words[2]), PushResult::Complete);
        assert!(!dec.in_progress());

        assert_eq!(dec.packet_name().unwrap(), packets::FIFO_SPACE_REPLY);
        assert_eq!(dec.field(packets::FIFO_SPACE_REPLY, "space").unwrap(), 0xBEEF);
    }

    #[test]
    fn unknown_type_tag_reported_on_first_word() {
        let (_, mut dec) = pair(16);
        assert_eq!(dec.push_word(0x00_7f), PushResult::UnknownType(0x7f));
        assert!(!dec.in_progress());

        // Decoder recovers: a valid packet parses next.
        let enc = PacketEncoder::new(
            LayoutRegistry::satellite_to_master(),
            WordSize::new(16).unwrap(),
        );
        let words = enc
            .encode(packets::ERROR, &[("code", FieldValue::Scalar(5))])
            .unwrap();
        for (i, word) in words.iter().enumerate() {
            let result = dec.push_word(*word);
            if i + 1 == words.len() {
                assert_eq!(result, PushResult::Complete);
            } else {
                assert_eq!(result, PushResult::NeedMore);
            }
        }
        assert_eq!(dec.field(packets::ERROR, "code").unwrap(), 5);
    }

    #[test]
    fn next_push_after_complete_starts_new_packet() {
        let (enc, mut dec) = pair(16);
        let first = enc
            .encode(packets::ERROR, &[("code", FieldValue::Scalar(1))])
            .unwrap();
        let second = enc
            .encode(packets::ERROR, &[("code", FieldValue::Scalar(2))])
            .unwrap();

        for word in &first {
            dec.push_word(*word);
        }
        assert_eq!(dec.field(packets::ERROR, "code").unwrap(), 1);

        for word in &second {
            dec.push_word(*word);
        }
        assert_eq!(dec.field(packets::ERROR, "code").unwrap(), 2);
    }

    #[test]
    fn reset_discards_partial_packet() {
        let (enc, mut dec) = pair(8);
        let words = enc
            .encode(packets::FIFO_SPACE_REPLY, &[("space", FieldValue::Scalar(9))])
            .unwrap();
        dec.push_word(words[0]);
        assert!(dec.in_progress());
        dec.reset();
        assert!(!dec.in_progress());
        assert!(matches!(
            dec.field(packets::FIFO_SPACE_REPLY, "space"),
            Err(WireError::Incomplete { .. })
        ));
    }

    #[test]
    fn packet_name_requires_a_completed_packet() {
        let (enc, mut dec) = pair(8);
        let words = enc
            .encode(packets::FIFO_SPACE_REPLY, &[("space", FieldValue::Scalar(1))])
            .unwrap();

        assert!(matches!(dec.packet_name(), Err(WireError::Incomplete { .. })));
        dec.push_word(words[0]);
        assert!(matches!(dec.packet_name(), Err(WireError::Incomplete { .. })));
        for word in &words[1..] {
            dec.push_word(*word);
        }
        assert_eq!(dec.packet_name().unwrap(), packets::FIFO_SPACE_REPLY);
    }

    #[test]
    fn streams_a_packet_padded_past_the_size_limit() {
        // 1016 bits: legal layout, but 22 words of 48 bits is 1056 bits
        // of link traffic. The last word is pure padding beyond the
        // packet body and must not trip the buffer bounds.
        let registry = LayoutRegistry::new(
            1,
            vec![PacketLayout {
                name: "blob".to_string(),
                type_id: 0x00,
                fields: vec![FieldDef {
                    name: "blob".to_string(),
                    width: MAX_PACKET_BITS - 16,
                }],
            }],
        )
        .unwrap();
        let word = WordSize::new(48).unwrap();
        let enc = PacketEncoder::new(registry.clone(), word);
        let mut dec = PacketDecoder::new(registry, word);

        let payload: Vec<u8> = (0..126).map(|i| i as u8).collect();
        let words = enc
            .encode("blob", &[("blob", FieldValue::Bytes(&payload))])
            .unwrap();
        assert_eq!(words.len(), 22);

        let mut last = PushResult::NeedMore;
        for word in &words {
            last = dec.push_word(*word);
        }
        assert_eq!(last, PushResult::Complete);
        assert_eq!(dec.field_bytes("blob", "blob").unwrap().as_ref(), &payload[..]);
    }

    #[test]
    fn write_packet_roundtrips_through_master_layouts() {
        let word = WordSize::new(64).unwrap();
        let enc = PacketEncoder::new(LayoutRegistry::master_to_satellite(), word);
        let mut dec = PacketDecoder::new(LayoutRegistry::master_to_satellite(), word);

        let mut payload = [0u8; 32];
        payload[0] = 0xAA;
        payload[31] = 0x55;
        let words = enc
            .encode(
                packets::WRITE,
                &[
                    ("timestamp", FieldValue::Scalar(1_000_000)),
                    ("channel", FieldValue::Scalar(3)),
                    ("address", FieldValue::Scalar(7)),
                    ("extra_data_cnt", FieldValue::Scalar(2)),
                    ("short_data", FieldValue::Bytes(&payload)),
                ],
            )
            .unwrap();
        assert_eq!(words.len(), 6);

        let mut last = PushResult::NeedMore;
        for word in &words {
            last = dec.push_word(*word);
        }
        assert_eq!(last, PushResult::Complete);
        assert_eq!(dec.field(packets::WRITE, "timestamp").unwrap(), 1_000_000);
        assert_eq!(dec.field(packets::WRITE, "channel").unwrap(), 3);
        assert_eq!(dec.field(packets::WRITE, "address").unwrap(), 7);
        assert_eq!(dec.field(packets::WRITE, "extra_data_cnt").unwrap(), 2);
        assert_eq!(
            dec.field_bytes(packets::WRITE, "short_data").unwrap().as_ref(),
            &payload
        );
    }
}
