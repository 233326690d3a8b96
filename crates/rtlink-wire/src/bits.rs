//! LSB-first bit cursors over byte buffers.
//!
//! Packet fields are packed at bit granularity: bit `i` of the stream
//! lives in byte `i / 8` at bit position `i % 8`. Both cursors assume the
//! caller sized the buffer for the full packet; positions and widths are
//! internal invariants, checked with assertions rather than `Result`.

/// Writes bit fields into a zeroed byte buffer, LSB-first.
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BitWriter<'a> {
    /// Cursor at the start of `buf`. The buffer must be zeroed.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::with_position(buf, 0)
    }

    /// Cursor at bit offset `pos` into `buf`.
    pub fn with_position(buf: &'a mut [u8], pos: usize) -> Self {
        assert!(pos <= buf.len() * 8, "bit position out of range");
        Self { buf, pos }
    }

    /// Current bit position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Write the low `width` bits of `value` at the cursor.
    pub fn write_bits(&mut self, value: u64, width: usize) {
        assert!(width <= 64, "bit field wider than 64");
        assert!(
            self.pos + width <= self.buf.len() * 8,
            "bit write past end of buffer"
        );

        let mut value = if width == 64 {
            value
        } else {
            value & ((1u64 << width) - 1)
        };
        let mut remaining = width;
        while remaining > 0 {
            let byte = self.pos / 8;
            let bit = self.pos % 8;
            let take = (8 - bit).min(remaining);
            let mask = ((1u16 << take) - 1) as u8;
            self.buf[byte] |= ((value as u8) & mask) << bit;
            value >>= take;
            self.pos += take;
            remaining -= take;
        }
    }

    /// Write `width` bits from `bytes`, LSB-first, zero-extending if
    /// `bytes` is shorter than the field.
    pub fn write_bytes(&mut self, bytes: &[u8], width: usize) {
        let mut remaining = width;
        for &b in bytes {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(8);
            self.write_bits(b as u64, take);
            remaining -= take;
        }
        // Trailing zeros: the buffer is already zeroed, just advance.
        assert!(
            self.pos + remaining <= self.buf.len() * 8,
            "bit write past end of buffer"
        );
        self.pos += remaining;
    }
}

/// Reads bit fields from a byte buffer, LSB-first.
pub struct BitReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Move the cursor to bit offset `pos`.
    pub fn seek(&mut self, pos: usize) {
        assert!(pos <= self.buf.len() * 8, "bit position out of range");
        self.pos = pos;
    }

    /// Read `width` bits (at most 64) at the cursor.
    pub fn read_bits(&mut self, width: usize) -> u64 {
        assert!(width <= 64, "bit field wider than 64");
        assert!(
            self.pos + width <= self.buf.len() * 8,
            "bit read past end of buffer"
        );

        let mut value = 0u64;
        let mut filled = 0usize;
        while filled < width {
            let byte = self.pos / 8;
            let bit = self.pos % 8;
            let take = (8 - bit).min(width - filled);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (self.buf[byte] >> bit) & mask;
            value |= (chunk as u64) << filled;
            self.pos += take;
            filled += take;
        }
        value
    }

    /// Read `width` bits as bytes, LSB-first. The last byte is
    /// zero-padded if `width` is not a multiple of 8.
    pub fn read_to_vec(&mut self, width: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(width.div_ceil(8));
        let mut remaining = width;
        while remaining > 0 {
            let take = remaining.min(8);
            out.push(self.read_bits(take) as u8);
            remaining -= take;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_mixed_widths() {
        let mut buf = [0u8; 32];
        let mut w = BitWriter::new(&mut buf);
        w.write_bits(0xA5, 8);
        w.write_bits(0x3, 2);
        w.write_bits(0x1234_5678_9ABC_DEF0, 64);
        w.write_bits(0x7FF, 11);
        let end = w.position();
        assert_eq!(end, 8 + 2 + 64 + 11);

        let mut r = BitReader::new(&buf);
        assert_eq!(r.read_bits(8), 0xA5);
        assert_eq!(r.read_bits(2), 0x3);
        assert_eq!(r.read_bits(64), 0x1234_5678_9ABC_DEF0);
        assert_eq!(r.read_bits(11), 0x7FF);
    }

    #[test]
    fn values_are_masked_to_width() {
        let mut buf = [0u8; 4];
        let mut w = BitWriter::new(&mut buf);
        w.write_bits(0xFF, 4); // only low 4 bits land
        w.write_bits(0, 4);
        let mut r = BitReader::new(&buf);
        assert_eq!(r.read_bits(8), 0x0F);
    }

    #[test]
    fn bytes_roundtrip_with_zero_extension() {
        let mut buf = [0u8; 16];
        let mut w = BitWriter::new(&mut buf);
        w.write_bytes(&[0x11, 0x22], 40); // 2 bytes into a 5-byte field
        assert_eq!(w.position(), 40);

        let mut r = BitReader::new(&buf);
        assert_eq!(r.read_to_vec(40), vec![0x11, 0x22, 0, 0, 0]);
    }

    #[test]
    fn unaligned_byte_field() {
        let mut buf = [0u8; 8];
        let mut w = BitWriter::new(&mut buf);
        w.write_bits(0x5, 3);
        w.write_bytes(&[0xAB, 0xCD], 16);

        let mut r = BitReader::new(&buf);
        assert_eq!(r.read_bits(3), 0x5);
        assert_eq!(r.read_to_vec(16), vec![0xAB, 0xCD]);
    }

    #[test]
    fn seek_reads_fields_out_of_order() {
        let mut buf = [0u8; 8];
        let mut w = BitWriter::new(&mut buf);
        w.write_bits(0x1, 8);
        w.write_bits(0xBEEF, 16);

        let mut r = BitReader::new(&buf);
        r.seek(8);
        assert_eq!(r.read_bits(16), 0xBEEF);
        r.seek(0);
        assert_eq!(r.read_bits(8), 0x1);
    }
}
