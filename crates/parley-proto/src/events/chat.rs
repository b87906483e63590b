//! Chat message and image attachment payloads.
//!
//! Outgoing payloads carry the sender's credentials; incoming payloads carry
//! the server's timestamp instead. Timestamps stay strings on the wire and are
//! parsed at render time, so one malformed value cannot fail a whole frame.

use serde::{Deserialize, Serialize};

/// Chat message sent by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Sender username
    pub username: String,

    /// Message text (already trimmed)
    pub message: String,

    /// Client-side RFC 3339 timestamp
    pub timestamp: String,

    /// Shared room access code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,
}

/// Chat message relayed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Sender username
    pub username: String,

    /// Message text
    pub message: String,

    /// Server timestamp (RFC 3339 or `%Y-%m-%d %H:%M:%S`)
    #[serde(default)]
    pub timestamp: String,
}

/// Image attachment sent by this client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingImage {
    /// Sender username
    pub username: String,

    /// Raw file contents
    #[serde(with = "serde_bytes")]
    pub image_data: Vec<u8>,

    /// Original filename
    pub filename: String,

    /// Declared media type
    pub mime_type: String,

    /// Shared room access code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,
}

/// Image attachment relayed by the server.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingImage {
    /// Sender username
    pub username: String,

    /// Raw file contents
    #[serde(with = "serde_bytes")]
    pub image_data: Vec<u8>,

    /// Original filename
    pub filename: String,

    /// Declared media type
    pub mime_type: String,

    /// Server timestamp
    #[serde(default)]
    pub timestamp: String,
}

// Image bytes can be megabytes; log their length instead.
impl std::fmt::Debug for OutgoingImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingImage")
            .field("username", &self.username)
            .field("image_data", &format_args!("<{} bytes>", self.image_data.len()))
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("security_code", &self.security_code.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl std::fmt::Debug for IncomingImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingImage")
            .field("username", &self.username)
            .field("image_data", &format_args!("<{} bytes>", self.image_data.len()))
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}
