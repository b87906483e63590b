//! CBOR-encoded room events.
//!
//! Frame headers are raw binary, payloads are CBOR. The payload type is fixed
//! by the header's [`EventKind`], so only the inner struct is serialized (no
//! variant tag).
//!
//! Events are split by direction: [`ClientEvent`] is what this client sends,
//! [`ServerEvent`] is what the room server broadcasts. Decoding a frame of the
//! wrong direction is an error rather than a silent misread.
//!
//! # Invariants
//!
//! Each variant maps to exactly one [`EventKind`] (enforced by match
//! exhaustiveness).

pub mod chat;
pub mod presence;
pub mod room;

use bytes::BufMut;
use serde::{Serialize, de::DeserializeOwned};

pub use self::{
    chat::{IncomingImage, IncomingMessage, OutgoingImage, OutgoingMessage},
    presence::{PresenceStatus, StatusNotice, StatusUpdate},
    room::{JoinAck, JoinRoom, UsernameError},
};
use crate::{
    EventKind, Frame, FrameHeader,
    errors::{ProtocolError, Result},
};

fn write_cbor<T: Serialize>(value: &T, dst: &mut impl BufMut) -> Result<()> {
    ciborium::ser::into_writer(value, dst.writer())
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))
}

fn read_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

fn check_size(bytes: &[u8]) -> Result<()> {
    if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
        return Err(ProtocolError::PayloadTooLarge {
            size: bytes.len(),
            max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
        });
    }
    Ok(())
}

fn frame_kind(frame: &Frame) -> Result<EventKind> {
    frame.header.kind_enum().ok_or(ProtocolError::UnknownEventKind(frame.header.kind()))
}

/// Events sent from the client to the room server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Request admission
    JoinRoom(JoinRoom),
    /// Send a chat message
    Message(OutgoingMessage),
    /// Send an image attachment
    Image(OutgoingImage),
    /// Announce own presence
    Status(StatusUpdate),
}

impl ClientEvent {
    /// Event kind corresponding to this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::JoinRoom(_) => EventKind::JoinRoom,
            Self::Message(_) => EventKind::SendMessage,
            Self::Image(_) => EventKind::SendImage,
            Self::Status(_) => EventKind::AnnounceStatus,
        }
    }

    /// Access code attached to this event, if any.
    #[must_use]
    pub fn security_code(&self) -> Option<&str> {
        match self {
            Self::JoinRoom(inner) => inner.security_code.as_deref(),
            Self::Message(inner) => inner.security_code.as_deref(),
            Self::Image(inner) => inner.security_code.as_deref(),
            Self::Status(inner) => inner.security_code.as_deref(),
        }
    }

    /// Encode the inner payload as CBOR.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        match self {
            Self::JoinRoom(inner) => write_cbor(inner, dst),
            Self::Message(inner) => write_cbor(inner, dst),
            Self::Image(inner) => write_cbor(inner, dst),
            Self::Status(inner) => write_cbor(inner, dst),
        }
    }

    /// Decode a payload of the given kind.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if bytes exceed 16 MB
    /// - `ProtocolError::WrongDirection` if `kind` is server-originated
    /// - `ProtocolError::CborDecode` if CBOR deserialization fails
    pub fn decode(kind: EventKind, bytes: &[u8]) -> Result<Self> {
        check_size(bytes)?;

        let event = match kind {
            EventKind::JoinRoom => Self::JoinRoom(read_cbor(bytes)?),
            EventKind::SendMessage => Self::Message(read_cbor(bytes)?),
            EventKind::SendImage => Self::Image(read_cbor(bytes)?),
            EventKind::AnnounceStatus => Self::Status(read_cbor(bytes)?),
            EventKind::JoinAck
            | EventKind::UsernameError
            | EventKind::Message
            | EventKind::Image
            | EventKind::UserStatus => {
                return Err(ProtocolError::WrongDirection(kind.to_u16()));
            },
        };

        Ok(event)
    }

    /// Convert into a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    /// - `ProtocolError::PayloadTooLarge` if the encoded event exceeds 16 MB
    pub fn into_frame(self) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        check_size(&buf)?;
        Ok(Frame::new(FrameHeader::new(self.kind()), buf))
    }

    /// Parse from a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownEventKind` if the header kind is unrecognized
    /// - Any error from [`ClientEvent::decode`]
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        Self::decode(frame_kind(frame)?, &frame.payload)
    }
}

/// Events broadcast by the room server to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Admission confirmed
    JoinAck(JoinAck),
    /// Admission rejected
    UsernameError(UsernameError),
    /// Chat message from any room member
    Message(IncomingMessage),
    /// Image attachment from any room member
    Image(IncomingImage),
    /// Presence change of any room member
    UserStatus(StatusNotice),
}

impl ServerEvent {
    /// Event kind corresponding to this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::JoinAck(_) => EventKind::JoinAck,
            Self::UsernameError(_) => EventKind::UsernameError,
            Self::Message(_) => EventKind::Message,
            Self::Image(_) => EventKind::Image,
            Self::UserStatus(_) => EventKind::UserStatus,
        }
    }

    /// Encode the inner payload as CBOR.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        match self {
            Self::JoinAck(inner) => write_cbor(inner, dst),
            Self::UsernameError(inner) => write_cbor(inner, dst),
            Self::Message(inner) => write_cbor(inner, dst),
            Self::Image(inner) => write_cbor(inner, dst),
            Self::UserStatus(inner) => write_cbor(inner, dst),
        }
    }

    /// Decode a payload of the given kind.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if bytes exceed 16 MB
    /// - `ProtocolError::WrongDirection` if `kind` is client-originated
    /// - `ProtocolError::CborDecode` if CBOR deserialization fails
    pub fn decode(kind: EventKind, bytes: &[u8]) -> Result<Self> {
        check_size(bytes)?;

        let event = match kind {
            EventKind::JoinAck => Self::JoinAck(read_cbor(bytes)?),
            EventKind::UsernameError => Self::UsernameError(read_cbor(bytes)?),
            EventKind::Message => Self::Message(read_cbor(bytes)?),
            EventKind::Image => Self::Image(read_cbor(bytes)?),
            EventKind::UserStatus => Self::UserStatus(read_cbor(bytes)?),
            EventKind::JoinRoom
            | EventKind::SendMessage
            | EventKind::SendImage
            | EventKind::AnnounceStatus => {
                return Err(ProtocolError::WrongDirection(kind.to_u16()));
            },
        };

        Ok(event)
    }

    /// Convert into a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::CborEncode` if serialization fails
    /// - `ProtocolError::PayloadTooLarge` if the encoded event exceeds 16 MB
    pub fn into_frame(self) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        check_size(&buf)?;
        Ok(Frame::new(FrameHeader::new(self.kind()), buf))
    }

    /// Parse from a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownEventKind` if the header kind is unrecognized
    /// - Any error from [`ServerEvent::decode`]
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        Self::decode(frame_kind(frame)?, &frame.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(code: Option<&str>) -> ClientEvent {
        ClientEvent::JoinRoom(JoinRoom {
            username: "alice".into(),
            security_code: code.map(String::from),
        })
    }

    #[test]
    fn security_code_omitted_when_absent() {
        let mut gated = Vec::new();
        join(Some("s3cret")).encode(&mut gated).unwrap();
        let mut open = Vec::new();
        join(None).encode(&mut open).unwrap();

        let gated: ciborium::Value = ciborium::de::from_reader(&gated[..]).unwrap();
        let open: ciborium::Value = ciborium::de::from_reader(&open[..]).unwrap();

        let keys = |v: &ciborium::Value| -> Vec<String> {
            v.as_map()
                .unwrap()
                .iter()
                .filter_map(|(k, _)| k.as_text().map(String::from))
                .collect()
        };
        assert!(keys(&gated).contains(&"security_code".to_string()));
        assert!(!keys(&open).contains(&"security_code".to_string()));
    }

    #[test]
    fn oversized_image_never_becomes_a_frame() {
        let max = FrameHeader::MAX_PAYLOAD_SIZE as usize;
        let image = ClientEvent::Image(OutgoingImage {
            username: "alice".into(),
            image_data: vec![0; max],
            filename: "big.png".into(),
            mime_type: "image/png".into(),
            security_code: None,
        });

        let err = image.into_frame().unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PayloadTooLarge { size, max: limit } if size > max && limit == max
        ));
    }

    #[test]
    fn client_event_round_trip() {
        let event = ClientEvent::Status(StatusUpdate {
            username: "alice".into(),
            status: PresenceStatus::Offline,
            security_code: Some("s3cret".into()),
        });

        let frame = event.clone().into_frame().unwrap();
        assert_eq!(frame.header.kind_enum(), Some(EventKind::AnnounceStatus));
        assert_eq!(ClientEvent::from_frame(&frame).unwrap(), event);
    }

    #[test]
    fn presence_encodes_lowercase() {
        let mut buf = Vec::new();
        write_cbor(&PresenceStatus::Online, &mut buf).unwrap();
        let value: String = read_cbor(&buf).unwrap();
        assert_eq!(value, "online");
    }

    #[test]
    fn image_bytes_preserved() {
        let event = ServerEvent::Image(IncomingImage {
            username: "bob".into(),
            image_data: vec![0x89, b'P', b'N', b'G', 0, 255],
            filename: "cat.png".into(),
            mime_type: "image/png".into(),
            timestamp: "2024-05-01 12:30:00".into(),
        });

        let frame = event.clone().into_frame().unwrap();
        let ServerEvent::Image(decoded) = ServerEvent::from_frame(&frame).unwrap() else {
            panic!("expected image");
        };
        assert_eq!(decoded.image_data.len(), 6);
        assert_eq!(decoded.filename, "cat.png");
        assert_eq!(decoded.mime_type, "image/png");
    }

    #[test]
    fn missing_optional_fields_default() {
        #[derive(Serialize)]
        struct Bare<'a> {
            message: &'a str,
        }

        let mut buf = Vec::new();
        write_cbor(&Bare { message: "taken" }, &mut buf).unwrap();

        let decoded = ServerEvent::decode(EventKind::UsernameError, &buf).unwrap();
        assert_eq!(
            decoded,
            ServerEvent::UsernameError(UsernameError { message: "taken".into(), block: false })
        );
    }

    #[test]
    fn wrong_direction_rejected() {
        let frame = join(None).into_frame().unwrap();
        assert_eq!(
            ServerEvent::from_frame(&frame),
            Err(ProtocolError::WrongDirection(EventKind::JoinRoom.to_u16()))
        );
    }

    #[test]
    fn unknown_kind_rejected() {
        let mut frame = join(None).into_frame().unwrap();
        frame.header.kind = 0x0999u16.to_be_bytes();
        assert_eq!(ServerEvent::from_frame(&frame), Err(ProtocolError::UnknownEventKind(0x0999)));
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        let result = ServerEvent::decode(EventKind::Message, &[0xFF, 0x00, 0x13]);
        assert!(matches!(result, Err(ProtocolError::CborDecode(_))));
    }
}
