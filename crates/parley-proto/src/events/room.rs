//! Room admission payloads.

use serde::{Deserialize, Serialize};

/// Request to join the room (`join_room`).
///
/// Sent once per connection lifetime. In an access-controlled room the
/// `security_code` is the shared capability token; without one the field is
/// omitted from the encoding entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoom {
    /// Requested display name
    pub username: String,

    /// Shared room access code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,
}

/// Server confirmation of admission (`join_ack`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinAck {
    /// Username as confirmed by the server
    pub username: String,

    /// Server-side status at admission time
    #[serde(default)]
    pub status: String,
}

/// Admission rejected (`username_error`).
///
/// With `block` set the rejection is final: wrong access code or a name the
/// server will not accept. Without it the message is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameError {
    /// Human-readable reason
    pub message: String,

    /// Permanently blocks this session
    #[serde(default)]
    pub block: bool,
}
