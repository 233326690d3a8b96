use bytes::Bytes;
use rtlink_wire::{BitReader, WordSize, MAX_PAYLOAD_BITS, SHORT_DATA_BITS};

use crate::error::{MasterError, Result};

/// Maximum write payload carried by one packet (512 bits).
pub const MAX_PAYLOAD_BYTES: usize = MAX_PAYLOAD_BITS / 8;

/// One entry of the write/request queue.
///
/// `notwrite = false` is a timed channel write. `notwrite = true` is a
/// non-write request selected by `address`: 0 is a FIFO-space query; 1
/// (read request) and 2 (read consume) are reserved for the upstream
/// read path and are currently transmitted as FIFO-space queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRequest {
    pub notwrite: bool,
    pub timestamp: u64,
    pub channel: u16,
    pub address: u16,
    pub payload: Bytes,
}

impl QueueRequest {
    /// A timed channel write. The payload must fit the 512-bit packet
    /// data field; bytes beyond the inline short field travel as
    /// zero-suppressed extra-data words.
    pub fn write(
        timestamp: u64,
        channel: u16,
        address: u16,
        payload: impl Into<Bytes>,
    ) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(MasterError::PayloadTooLarge(payload.len()));
        }
        Ok(Self {
            notwrite: false,
            timestamp,
            channel,
            address,
            payload,
        })
    }

    /// A FIFO-space query for `channel`. Travels through the same queue
    /// as writes so its answer is ordered relative to them.
    pub fn fifo_space(channel: u16) -> Self {
        Self {
            notwrite: true,
            timestamp: 0,
            channel,
            address: 0,
            payload: Bytes::new(),
        }
    }
}

/// A queue entry staged in the transmit read buffer, with its
/// extra-data words and zero-suppressed count precomputed.
#[derive(Debug)]
pub(crate) struct PreparedEntry {
    pub request: QueueRequest,
    pub short_data: [u8; SHORT_DATA_BITS / 8],
    pub extra_words: Vec<u64>,
    pub extra_cnt: usize,
}

/// Split a dequeued entry at the short-data boundary and scan the
/// trailing payload in word-width chunks for the highest nonzero one.
pub(crate) fn prepare(request: QueueRequest, word: WordSize) -> PreparedEntry {
    let mut full = [0u8; MAX_PAYLOAD_BYTES];
    full[..request.payload.len()].copy_from_slice(&request.payload);

    let mut short_data = [0u8; SHORT_DATA_BITS / 8];
    short_data.copy_from_slice(&full[..SHORT_DATA_BITS / 8]);

    let extra_bits = MAX_PAYLOAD_BITS - SHORT_DATA_BITS;
    let mut reader = BitReader::new(&full[SHORT_DATA_BITS / 8..]);
    let slots = word.words_for(extra_bits);
    let mut extra_words = Vec::with_capacity(slots);
    let mut extra_cnt = 0;
    for i in 0..slots {
        let remaining = extra_bits - i * word.bits();
        let chunk = reader.read_bits(remaining.min(word.bits()));
        extra_words.push(chunk);
        if chunk != 0 {
            extra_cnt = i + 1;
        }
    }

    PreparedEntry {
        request,
        short_data,
        extra_words,
        extra_cnt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(bits: usize) -> WordSize {
        WordSize::new(bits).unwrap()
    }

    #[test]
    fn short_payload_has_no_extra_words() {
        let request = QueueRequest::write(100, 3, 0, vec![0x01]).unwrap();
        let prepared = prepare(request, word(64));
        assert_eq!(prepared.short_data[0], 0x01);
        assert_eq!(prepared.extra_cnt, 0);
        assert!(prepared.extra_words.iter().all(|w| *w == 0));
    }

    #[test]
    fn trailing_zero_words_are_suppressed() {
        // 40-byte payload: extra region is bytes 32..64; only byte 33 set.
        let mut payload = vec![0u8; 40];
        payload[33] = 0xCC;
        let request = QueueRequest::write(0, 1, 0, payload).unwrap();

        let prepared = prepare(request, word(64));
        assert_eq!(prepared.extra_words.len(), 4);
        assert_eq!(prepared.extra_cnt, 1);
        assert_eq!(prepared.extra_words[0], 0xCC00);
    }

    #[test]
    fn highest_nonzero_word_sets_the_count() {
        let mut payload = vec![0u8; MAX_PAYLOAD_BYTES];
        payload[33] = 0x11;
        payload[63] = 0x22; // last extra word
        let request = QueueRequest::write(0, 1, 0, payload).unwrap();

        let prepared = prepare(request, word(64));
        assert_eq!(prepared.extra_cnt, 4);
        assert_eq!(prepared.extra_words[3], 0x22u64 << 56);
    }

    #[test]
    fn narrow_words_chunk_the_extra_region() {
        let mut payload = vec![0u8; MAX_PAYLOAD_BYTES];
        payload[34] = 0xAB; // third byte of the extra region
        let request = QueueRequest::write(0, 1, 0, payload).unwrap();

        let prepared = prepare(request, word(8));
        assert_eq!(prepared.extra_words.len(), 32);
        assert_eq!(prepared.extra_cnt, 3);
        assert_eq!(prepared.extra_words[2], 0xAB);
    }

    #[test]
    fn oversized_payload_rejected() {
        let err = QueueRequest::write(0, 0, 0, vec![0u8; MAX_PAYLOAD_BYTES + 1]).unwrap_err();
        assert!(matches!(err, MasterError::PayloadTooLarge(65)));
    }

    #[test]
    fn fifo_space_entry_shape() {
        let request = QueueRequest::fifo_space(9);
        assert!(request.notwrite);
        assert_eq!(request.channel, 9);
        assert_eq!(request.address, 0);
        assert!(request.payload.is_empty());
    }
}
