use crate::error::{Result, WireError};

/// Validated bus word width.
///
/// The link data bus is byte-granular: widths are multiples of 8 between
/// 8 and 64 bits. Words narrower than 64 bits occupy the low bits of the
/// `u64` carrying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSize(usize);

impl WordSize {
    /// Validate and wrap a word width in bits.
    pub fn new(bits: usize) -> Result<Self> {
        if bits == 0 || bits > 64 || bits % 8 != 0 {
            return Err(WireError::InvalidWordSize(bits));
        }
        Ok(Self(bits))
    }

    /// Width in bits.
    pub fn bits(self) -> usize {
        self.0
    }

    /// Width in bytes.
    pub fn bytes(self) -> usize {
        self.0 / 8
    }

    /// Mask covering the valid bits of a word.
    pub fn mask(self) -> u64 {
        if self.0 == 64 {
            u64::MAX
        } else {
            (1u64 << self.0) - 1
        }
    }

    /// Number of words needed to carry `bits` bits.
    pub fn words_for(self, bits: usize) -> usize {
        bits.div_ceil(self.0)
    }
}

/// One cycle on the link bus: a frame-valid flag and a data word.
///
/// `data` is meaningful only while `frame` is set; idle cycles carry
/// `frame = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkWord {
    pub frame: bool,
    pub data: u64,
}

impl LinkWord {
    /// An idle bus cycle.
    pub fn idle() -> Self {
        Self {
            frame: false,
            data: 0,
        }
    }

    /// A frame-valid cycle carrying `data`.
    pub fn data(data: u64) -> Self {
        Self { frame: true, data }
    }
}
