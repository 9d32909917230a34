#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Packet payload does not cover a region of the fixed packet layout.
    #[error("not enough bytes for {region}: need {minimum}, got {actual}")]
    Framing {
        region: &'static str,
        /// Number of bytes we got
        actual: usize,
        /// Minimum number of bytes required to extract the region
        minimum: usize,
    },

    /// A token of an ASCII hex dump line could not be converted to a byte.
    #[error("packet {packet}: invalid hex byte token {token:?} at position {position}")]
    HexToken {
        packet: usize,
        position: usize,
        token: String,
    },

    #[error("line {line}: invalid SUB-20 record: {reason}")]
    Sub20Line { line: usize, reason: String },

    #[error("byte length {len} is not a multiple of {chunk}")]
    Alignment { len: usize, chunk: usize },

    /// Event code outside 0..=3. Only possible for a word wider than 20 bits.
    #[error("invalid event code {code} in word {word:#x}")]
    InvalidCode { word: u32, code: u32 },

    #[error("invalid ADD bit {add} in word {word:#x}")]
    InvalidAdd { word: u32, add: u32 },

    #[error("failed to build decode thread pool: {0}")]
    ThreadPool(String),

    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors confined to a single packet, i.e., the packet can be skipped and the
    /// stream continued.
    #[must_use]
    pub fn is_packet_error(&self) -> bool {
        matches!(self, Error::Framing { .. } | Error::HexToken { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
