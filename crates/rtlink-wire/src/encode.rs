use crate::bits::{BitReader, BitWriter};
use crate::bus::WordSize;
use crate::error::{Result, WireError};
use crate::layout::{LayoutRegistry, PADDED_PACKET_BYTES, TYPE_BITS};

/// A value supplied for one packet field.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    /// An integer field up to 64 bits wide.
    Scalar(u64),
    /// A byte payload, LSB-first, zero-extended to the field width.
    Bytes(&'a [u8]),
}

/// Schema-driven packet serializer.
///
/// Packs the type tag and every layout field LSB-first, then slices the
/// result into bus words. Fields not supplied by the caller encode as
/// zero.
#[derive(Debug)]
pub struct PacketEncoder {
    registry: LayoutRegistry,
    word: WordSize,
}

impl PacketEncoder {
    pub fn new(registry: LayoutRegistry, word: WordSize) -> Self {
        Self { registry, word }
    }

    /// The layout table driving this encoder.
    pub fn registry(&self) -> &LayoutRegistry {
        &self.registry
    }

    /// Bus word width.
    pub fn word(&self) -> WordSize {
        self.word
    }

    /// Number of bus words `packet` occupies on the link.
    pub fn words_for(&self, packet: &str) -> Result<usize> {
        Ok(self.registry.get(packet)?.word_count(self.word))
    }

    /// Encode `packet` with the given field values into bus words.
    pub fn encode(&self, packet: &str, fields: &[(&str, FieldValue<'_>)]) -> Result<Vec<u64>> {
        let layout = self.registry.get(packet)?;

        for (name, _) in fields {
            if layout.field_width(name).is_none() {
                return Err(WireError::UnknownField {
                    packet: packet.to_string(),
                    field: name.to_string(),
                });
            }
        }

        let word_count = layout.word_count(self.word);
        let mut buf = [0u8; PADDED_PACKET_BYTES];
        let mut writer = BitWriter::new(&mut buf);
        writer.write_bits(layout.type_id as u64, TYPE_BITS);

        for def in &layout.fields {
            let supplied = fields
                .iter()
                .find(|(name, _)| *name == def.name)
                .map(|(_, value)| *value);
            match supplied {
                Some(FieldValue::Scalar(value)) => {
                    if def.width < 64 && value >> def.width != 0 {
                        return Err(WireError::ValueTooWide {
                            field: def.name.clone(),
                            width: def.width,
                            value,
                        });
                    }
                    if def.width <= 64 {
                        writer.write_bits(value, def.width);
                    } else {
                        // Wide field given as scalar: low 64 bits, rest zero.
                        writer.write_bits(value, 64);
                        writer.write_bytes(&[], def.width - 64);
                    }
                }
                Some(FieldValue::Bytes(bytes)) => {
                    if bytes.len() > def.width.div_ceil(8) {
                        return Err(WireError::BytesTooWide {
                            field: def.name.clone(),
                            width: def.width,
                            len: bytes.len(),
                        });
                    }
                    writer.write_bytes(bytes, def.width);
                }
                None => writer.write_bytes(&[], def.width),
            }
        }

        let mut reader = BitReader::new(&buf);
        let words = (0..word_count)
            .map(|_| reader.read_bits(self.word.bits()))
            .collect();
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{packets, FieldDef, PacketLayout, MAX_PACKET_BITS};

    fn near_cap_registry() -> LayoutRegistry {
        // 1016 bits total: inside the packet size limit, but 48-bit
        // words round it up to 22 words = 1056 bits on the link.
        LayoutRegistry::new(
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
        .unwrap()
    }

    fn encoder(bits: usize) -> PacketEncoder {
        PacketEncoder::new(
            LayoutRegistry::master_to_satellite(),
            WordSize::new(bits).unwrap(),
        )
    }

    #[test]
    fn echo_request_is_one_padded_word() {
        let enc = encoder(16);
        let words = enc.encode(packets::ECHO_REQUEST, &[]).unwrap();
        assert_eq!(words, vec![0x0000]); // type tag 0, padding zero
    }

    #[test]
    fn set_time_packs_tag_then_timestamp() {
        let enc = encoder(16);
        let words = enc
            .encode(
                packets::SET_TIME,
                &[("timestamp", FieldValue::Scalar(0x1122_3344_5566_7788))],
            )
            .unwrap();
        // 72 bits total -> 5 words of 16; tag in the low byte of word 0,
        // then the timestamp LSB-first.
        assert_eq!(words.len(), 5);
        assert_eq!(words[0] & 0xff, 0x01);
        assert_eq!(words[0] >> 8, 0x88);
        assert_eq!(words[1], 0x6677);
        assert_eq!(words[4] & 0xff, 0x11);
    }

    #[test]
    fn unset_fields_encode_as_zero() {
        let enc = encoder(16);
        let words = enc
            .encode(packets::WRITE, &[("channel", FieldValue::Scalar(3))])
            .unwrap();
        assert_eq!(words.len(), 23);
        // timestamp (bits 8..72) all zero
        assert_eq!(words[0] >> 8, 0);
        for word in &words[1..4] {
            assert_eq!(*word, 0);
        }
    }

    #[test]
    fn rejects_unknown_field() {
        let enc = encoder(16);
        let err = enc
            .encode(packets::WRITE, &[("bogus", FieldValue::Scalar(1))])
            .unwrap_err();
        assert!(matches!(err, WireError::UnknownField { .. }));
    }

    #[test]
    fn rejects_over_wide_scalar() {
        let enc = encoder(16);
        let err = enc
            .encode(packets::RESET, &[("phy", FieldValue::Scalar(2))])
            .unwrap_err();
        assert!(matches!(err, WireError::ValueTooWide { .. }));
    }

    #[test]
    fn rejects_over_long_bytes() {
        let enc = encoder(16);
        let long = [0u8; 33]; // short_data is 256 bits = 32 bytes
        let err = enc
            .encode(packets::WRITE, &[("short_data", FieldValue::Bytes(&long))])
            .unwrap_err();
        assert!(matches!(err, WireError::BytesTooWide { .. }));
    }

    #[test]
    fn word_padding_may_run_past_the_packet_size_limit() {
        let enc = PacketEncoder::new(near_cap_registry(), WordSize::new(48).unwrap());
        let payload: Vec<u8> = (0..126).map(|i| i as u8).collect();
        let words = enc
            .encode("blob", &[("blob", FieldValue::Bytes(&payload))])
            .unwrap();
        assert_eq!(words.len(), 22);
        // Tag byte, then the payload LSB-first.
        assert_eq!(words[0], 0x0403_0201_0000);
        // Final word: last payload byte plus pure padding.
        assert_eq!(words[21], 0x7D);
    }

    #[test]
    fn words_narrower_than_64_stay_masked() {
        let enc = encoder(8);
        let words = enc
            .encode(
                packets::SET_TIME,
                &[("timestamp", FieldValue::Scalar(u64::MAX))],
            )
            .unwrap();
        assert_eq!(words.len(), 9);
        assert!(words.iter().all(|w| *w <= 0xff));
        assert_eq!(words[0], 0x01);
        assert!(words[1..].iter().all(|w| *w == 0xff));
    }
}
