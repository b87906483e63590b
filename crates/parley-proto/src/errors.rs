//! Protocol error types.

use thiserror::Error;

/// Convenience alias for protocol results.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while framing or decoding wire events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than a frame header.
    #[error("frame too short: expected {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Header claims more payload than the buffer holds.
    #[error("frame truncated: header claims {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload size claimed by the header
        expected: usize,
        /// Payload bytes actually present
        actual: usize,
    },

    /// Magic number does not identify a Parley frame.
    #[error("invalid magic number")]
    InvalidMagic,

    /// Header version is not supported by this build.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Payload exceeds [`crate::FrameHeader::MAX_PAYLOAD_SIZE`].
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual payload size
        size: usize,
        /// Maximum permitted size
        max: usize,
    },

    /// Event kind is not recognized.
    #[error("unknown event kind: {0:#06x}")]
    UnknownEventKind(u16),

    /// Event kind is valid but flows in the other direction.
    #[error("event kind {0:#06x} is not valid in this direction")]
    WrongDirection(u16),

    /// CBOR serialization failed.
    #[error("CBOR encode failed: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed.
    #[error("CBOR decode failed: {0}")]
    CborDecode(String),
}

impl ProtocolError {
    /// Returns true if the frame can be skipped without tearing down the
    /// connection.
    ///
    /// A payload that fails to decode is isolated to that one event. Framing
    /// errors (bad magic, truncation) mean the stream itself is corrupt.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownEventKind(_)
                | Self::WrongDirection(_)
                | Self::CborDecode(_)
                | Self::CborEncode(_)
        )
    }
}
