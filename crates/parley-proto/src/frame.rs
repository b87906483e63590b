//! Frame type combining header and payload.
//!
//! A `Frame` is a pure data holder: the 16-byte header plus already-encoded
//! payload bytes. For typed access see [`crate::ClientEvent::into_frame`] and
//! [`crate::ServerEvent::from_frame`].

use bytes::{BufMut, Bytes};

use crate::{
    FrameHeader,
    errors::{ProtocolError, Result},
};

/// Complete protocol frame.
///
/// Layout on the wire: `[FrameHeader: 16 bytes] + [payload: variable bytes]`
///
/// # Invariants
///
/// - `payload.len()` matches `header.payload_size()`. Enforced by
///   [`Frame::new`] and verified by [`Frame::decode`].
/// - `payload.len()` never exceeds [`FrameHeader::MAX_PAYLOAD_SIZE`] on the
///   wire. Oversized frames are rejected by [`Frame::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header
    pub header: FrameHeader,

    /// Raw payload bytes (CBOR-encoded)
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame, setting the header's payload size from `payload`.
    ///
    /// Payloads longer than `u32::MAX` saturate the size field; such frames
    /// are rejected by [`Frame::encode`].
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let payload_len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
        header.set_payload_size(payload_len);
        Self { header, payload }
    }

    /// Total encoded length (header plus payload).
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        FrameHeader::SIZE + self.payload.len()
    }

    /// Encode frame into buffer.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if payload exceeds 16 MB
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.payload.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Decode frame from wire format.
    ///
    /// Only structural framing is validated; the payload stays raw bytes.
    /// Trailing bytes after the claimed payload are ignored.
    ///
    /// # Errors
    ///
    /// - `ProtocolError` if the header is invalid
    /// - `ProtocolError::FrameTruncated` if fewer payload bytes than claimed
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;
        let payload_size = header.payload_size() as usize;
        let total_size = FrameHeader::SIZE + payload_size;

        let body = bytes.get(FrameHeader::SIZE..total_size).ok_or(ProtocolError::FrameTruncated {
            expected: payload_size,
            actual: bytes.len().saturating_sub(FrameHeader::SIZE),
        })?;

        Ok(Self { header: *header, payload: Bytes::copy_from_slice(body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventKind;

    #[test]
    fn new_sets_payload_size() {
        let frame = Frame::new(FrameHeader::new(EventKind::SendMessage), vec![1, 2, 3]);
        assert_eq!(frame.header.payload_size(), 3);
        assert_eq!(frame.encoded_len(), FrameHeader::SIZE + 3);
    }

    #[test]
    fn encode_decode() {
        let frame = Frame::new(FrameHeader::new(EventKind::Message), b"hello".to_vec());

        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), FrameHeader::SIZE + 5);

        let decoded = Frame::decode(&buf).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn trailing_bytes_ignored() {
        let frame = Frame::new(FrameHeader::new(EventKind::JoinAck), b"ok".to_vec());
        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();
        buf.extend_from_slice(b"next frame");

        let decoded = Frame::decode(&buf).unwrap();
        assert_eq!(&decoded.payload[..], b"ok");
    }

    #[test]
    fn truncated_payload_rejected() {
        let frame = Frame::new(FrameHeader::new(EventKind::Image), vec![0u8; 64]);
        let mut buf = Vec::new();
        frame.encode(&mut buf).unwrap();
        buf.truncate(FrameHeader::SIZE + 10);

        assert_eq!(
            Frame::decode(&buf),
            Err(ProtocolError::FrameTruncated { expected: 64, actual: 10 })
        );
    }

    #[test]
    fn oversized_payload_rejected_on_encode() {
        let big = vec![0u8; FrameHeader::MAX_PAYLOAD_SIZE as usize + 1];
        let frame = Frame::new(FrameHeader::new(EventKind::SendImage), big);

        let mut buf = Vec::new();
        let result = frame.encode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
        assert!(buf.is_empty());
    }
}
