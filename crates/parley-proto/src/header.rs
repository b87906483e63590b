//! Frame header with zero-copy parsing.
//!
//! The `FrameHeader` is a fixed 16-byte structure serialized as raw binary
//! (Big Endian). A receiver can reject garbage, unknown versions and oversized
//! payloads before allocating anything for the body.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    EventKind,
    errors::{ProtocolError, Result},
};

/// Fixed 16-byte frame header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays so the struct has no alignment
/// requirements and every 16-byte pattern is a valid value.
///
/// Layout:
///
/// | Bytes | Field | Notes |
/// |---|---|---|
/// | 0-3 | magic | `PRLY` |
/// | 4 | version | `0x01` |
/// | 5 | reserved | zero |
/// | 6-7 | kind | [`EventKind`] as u16 |
/// | 8-11 | payload_size | u32 |
/// | 12-15 | sequence | per-connection frame counter |
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    magic: [u8; 4],
    version: u8,
    reserved: u8,
    pub(crate) kind: [u8; 2],
    pub(crate) payload_size: [u8; 4],
    sequence: [u8; 4],
}

impl FrameHeader {
    /// Size of the serialized header.
    pub const SIZE: usize = 16;

    /// Magic number: "PRLY" in ASCII.
    pub const MAGIC: u32 = 0x5052_4C59;

    /// Current protocol version.
    pub const VERSION: u8 = 0x01;

    /// Maximum payload size (16 MB), large enough for image attachments.
    pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

    /// Create a new header for the given event kind.
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            reserved: 0,
            kind: kind.to_u16().to_be_bytes(),
            payload_size: [0; 4],
            sequence: [0; 4],
        }
    }

    /// Parse header from network bytes (zero-copy).
    ///
    /// Validation runs cheapest first: length, magic, version, payload size.
    /// The event kind is NOT validated here so that unknown kinds can be
    /// skipped by the caller without dropping the stream.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if buffer is shorter than 16 bytes
    /// - `ProtocolError::InvalidMagic` if magic number is wrong
    /// - `ProtocolError::UnsupportedVersion` if version is not `0x01`
    /// - `ProtocolError::PayloadTooLarge` if payload size exceeds maximum
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::FrameTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0;

        if u32::from_be_bytes(header.magic) != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        let payload_size = u32::from_be_bytes(header.payload_size);
        if payload_size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload_size as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// Serialize header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Protocol magic number.
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_be_bytes(self.magic)
    }

    /// Protocol version byte.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Event kind as raw u16.
    #[must_use]
    pub fn kind(&self) -> u16 {
        u16::from_be_bytes(self.kind)
    }

    /// Event kind as enum. `None` if unrecognized.
    #[must_use]
    pub fn kind_enum(&self) -> Option<EventKind> {
        EventKind::from_u16(self.kind())
    }

    /// Payload size in bytes (max 16 MB).
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }

    /// Per-connection frame counter assigned by the sender.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        u32::from_be_bytes(self.sequence)
    }

    /// Set the frame counter.
    pub fn set_sequence(&mut self, sequence: u32) {
        self.sequence = sequence.to_be_bytes();
    }

    /// Set payload size.
    pub fn set_payload_size(&mut self, size: u32) {
        self.payload_size = size.to_be_bytes();
    }
}

// Can't derive due to packed repr
impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("magic", &format!("{:#010x}", self.magic()))
            .field("version", &self.version())
            .field("kind", &format!("{:#06x}", self.kind()))
            .field("payload_size", &self.payload_size())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for FrameHeader {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (any::<u16>(), 0u32..=Self::MAX_PAYLOAD_SIZE, any::<u32>())
                .prop_map(|(kind, payload_size, sequence)| Self {
                    magic: Self::MAGIC.to_be_bytes(),
                    version: Self::VERSION,
                    reserved: 0,
                    kind: kind.to_be_bytes(),
                    payload_size: payload_size.to_be_bytes(),
                    sequence: sequence.to_be_bytes(),
                })
                .boxed()
        }
    }

    fn valid_prefix() -> [u8; FrameHeader::SIZE] {
        let mut buf = [0u8; FrameHeader::SIZE];
        buf[0..4].copy_from_slice(&FrameHeader::MAGIC.to_be_bytes());
        buf[4] = FrameHeader::VERSION;
        buf
    }

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
        assert_eq!(FrameHeader::SIZE, 16);
    }

    #[test]
    fn magic_spells_prly() {
        assert_eq!(&FrameHeader::MAGIC.to_be_bytes(), b"PRLY");
    }

    proptest! {
        #[test]
        fn header_round_trip(header in any::<FrameHeader>()) {
            let bytes = header.to_bytes();
            let parsed = FrameHeader::from_bytes(&bytes).expect("should parse");
            prop_assert_eq!(&header, parsed);
        }

        #[test]
        fn unknown_kinds_still_parse(kind in 0x0200u16..) {
            let mut buf = valid_prefix();
            buf[6..8].copy_from_slice(&kind.to_be_bytes());
            let parsed = FrameHeader::from_bytes(&buf).expect("should parse");
            prop_assert_eq!(parsed.kind(), kind);
            prop_assert_eq!(parsed.kind_enum(), None);
        }
    }

    #[test]
    fn new_sets_kind() {
        let header = FrameHeader::new(EventKind::UserStatus);
        assert_eq!(header.kind_enum(), Some(EventKind::UserStatus));
        assert_eq!(header.payload_size(), 0);
        assert_eq!(header.magic(), FrameHeader::MAGIC);
    }

    #[test]
    fn reject_short_buffer() {
        let result = FrameHeader::from_bytes(&[0u8; 10]);
        assert_eq!(result, Err(ProtocolError::FrameTooShort { expected: 16, actual: 10 }));
    }

    #[test]
    fn reject_invalid_magic() {
        let mut buf = valid_prefix();
        buf[0..4].copy_from_slice(b"LOFR");
        assert_eq!(FrameHeader::from_bytes(&buf), Err(ProtocolError::InvalidMagic));
    }

    #[test]
    fn reject_invalid_version() {
        let mut buf = valid_prefix();
        buf[4] = 0x02;
        assert_eq!(FrameHeader::from_bytes(&buf), Err(ProtocolError::UnsupportedVersion(0x02)));
    }

    #[test]
    fn reject_oversized_payload() {
        let mut buf = valid_prefix();
        let oversized = FrameHeader::MAX_PAYLOAD_SIZE + 1;
        buf[8..12].copy_from_slice(&oversized.to_be_bytes());

        assert_eq!(
            FrameHeader::from_bytes(&buf),
            Err(ProtocolError::PayloadTooLarge {
                size: oversized as usize,
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            })
        );
    }
}
