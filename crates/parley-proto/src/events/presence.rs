//! Presence payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Presence value a client announces for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// User is active
    Online,
    /// User is away or gone
    Offline,
}

impl PresenceStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence announcement from this client (`user_status`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Subject username
    pub username: String,

    /// Announced status
    pub status: PresenceStatus,

    /// Shared room access code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,
}

/// Presence change relayed by the server (`user_status`).
///
/// `status` stays a free-form string: the server may relay values this client
/// does not know about, and those are still worth displaying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNotice {
    /// Subject username
    pub username: String,

    /// Reported status
    pub status: String,
}
