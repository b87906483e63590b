//! Event kinds carried in the frame header.

/// Identifies the payload type of a frame.
///
/// Client-originated kinds live in `0x00xx`, server-originated kinds in
/// `0x01xx`. Each kind maps to exactly one payload struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EventKind {
    /// Client asks to join the room (`join_room`).
    JoinRoom = 0x0001,
    /// Client sends a chat message (`message`).
    SendMessage = 0x0002,
    /// Client sends an image attachment (`image`).
    SendImage = 0x0003,
    /// Client announces its presence (`user_status`).
    AnnounceStatus = 0x0004,

    /// Server confirms admission (`join_ack`).
    JoinAck = 0x0101,
    /// Server rejects the username or access code (`username_error`).
    UsernameError = 0x0102,
    /// Server relays a chat message (`message`).
    Message = 0x0103,
    /// Server relays an image attachment (`image`).
    Image = 0x0104,
    /// Server relays a presence change (`user_status`).
    UserStatus = 0x0105,
}

impl EventKind {
    /// Convert from the raw header value. `None` if unrecognized.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::JoinRoom),
            0x0002 => Some(Self::SendMessage),
            0x0003 => Some(Self::SendImage),
            0x0004 => Some(Self::AnnounceStatus),
            0x0101 => Some(Self::JoinAck),
            0x0102 => Some(Self::UsernameError),
            0x0103 => Some(Self::Message),
            0x0104 => Some(Self::Image),
            0x0105 => Some(Self::UserStatus),
            _ => None,
        }
    }

    /// Raw header value.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// True if the client produces this kind.
    pub const fn is_client_originated(self) -> bool {
        (self as u16) < 0x0100
    }

    /// Event name as used by the room server.
    pub const fn name(self) -> &'static str {
        match self {
            Self::JoinRoom => "join_room",
            Self::SendMessage | Self::Message => "message",
            Self::SendImage | Self::Image => "image",
            Self::AnnounceStatus | Self::UserStatus => "user_status",
            Self::JoinAck => "join_ack",
            Self::UsernameError => "username_error",
        }
    }
}
