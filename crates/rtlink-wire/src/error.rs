/// Errors that can occur while building layouts or encoding/decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The bus word width is not a multiple of 8 in 8..=64.
    #[error("invalid word size {0} bits (must be a multiple of 8, between 8 and 64)")]
    InvalidWordSize(usize),

    /// No packet layout registered under this name.
    #[error("unknown packet '{0}'")]
    UnknownPacket(String),

    /// No field with this name in the packet's layout.
    #[error("unknown field '{field}' in packet '{packet}'")]
    UnknownField { packet: String, field: String },

    /// A scalar value does not fit in its declared field width.
    #[error("value {value:#x} does not fit in {width}-bit field '{field}'")]
    ValueTooWide {
        field: String,
        width: usize,
        value: u64,
    },

    /// A byte payload is longer than its declared field width.
    #[error("{len} bytes do not fit in {width}-bit field '{field}'")]
    BytesTooWide {
        field: String,
        width: usize,
        len: usize,
    },

    /// The field is wider than 64 bits and cannot be read as a scalar.
    #[error("field '{field}' is {width} bits wide, read it as bytes")]
    FieldTooWide { field: String, width: usize },

    /// A decoded packet was accessed before all of its words arrived.
    #[error("packet incomplete ({got} of {expected} words)")]
    Incomplete { got: usize, expected: usize },

    /// A layout table failed structural validation.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// A layout table failed to parse from JSON.
    #[error("layout json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;
