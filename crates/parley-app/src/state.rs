//! Observable application state types.
//!
//! These structures are the view model: what the renderer needs, without the
//! session machinery behind it.

use chrono::NaiveDateTime;
use parley_client::TransportEvent;
use parley_core::{Admission, Session};

/// Transport state as shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// First dial in progress
    Connecting,
    /// Live connection
    Connected,
    /// Waiting to retry
    Reconnecting {
        /// Retry number, 1-based
        attempt: u32,
    },
    /// Connection dropped
    Disconnected {
        /// Why it dropped
        reason: String,
    },
    /// Retry budget used up
    Failed,
}

impl LinkStatus {
    /// Status after a transport event. Dial failures leave it unchanged.
    #[must_use]
    pub fn after(&self, event: &TransportEvent) -> Self {
        match event {
            TransportEvent::Connected | TransportEvent::Reconnected { .. } => Self::Connected,
            TransportEvent::Disconnected { reason } => {
                Self::Disconnected { reason: reason.clone() }
            },
            TransportEvent::Reconnecting { attempt } => Self::Reconnecting { attempt: *attempt },
            TransportEvent::ReconnectFailed => Self::Failed,
            TransportEvent::ConnectError { .. } | TransportEvent::ConnectTimeout => self.clone(),
        }
    }
}

/// Session state as shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Admission state
    pub admission: Admission,
    /// Composer accepts sends
    pub input_enabled: bool,
    /// Reason for a block. `None` unless blocked.
    pub block_reason: Option<String>,
}

impl SessionView {
    /// Capture the parts of a session the UI shows.
    pub fn of(session: &Session) -> Self {
        Self {
            admission: session.admission(),
            input_enabled: session.input_enabled(),
            block_reason: session.block_reason().map(str::to_string),
        }
    }
}

impl Default for SessionView {
    fn default() -> Self {
        Self { admission: Admission::Unjoined, input_enabled: false, block_reason: None }
    }
}

/// Chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Sender
    pub username: String,
    /// Message text
    pub text: String,
    /// Server timestamp. `None` if missing or malformed.
    pub timestamp: Option<NaiveDateTime>,
}

/// Image attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Sender
    pub username: String,
    /// Raw file contents
    pub data: Vec<u8>,
    /// Original filename
    pub filename: String,
    /// Media type
    pub media_type: String,
    /// Server timestamp. `None` if missing or malformed.
    pub timestamp: Option<NaiveDateTime>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("username", &self.username)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Presence notice for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Subject
    pub username: String,
    /// Reported status
    pub status: String,
    /// Local receipt time
    pub timestamp: Option<NaiveDateTime>,
}

impl StatusLine {
    /// Notice text: `"<username> is <status>"`.
    pub fn text(&self) -> String {
        format!("{} is {}", self.username, self.status)
    }
}

/// One entry in the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatItem {
    /// Text message
    Message(Message),
    /// Image attachment
    Attachment(Attachment),
    /// Presence notice
    Status(StatusLine),
}

impl ChatItem {
    /// Username the item is about.
    pub fn username(&self) -> &str {
        match self {
            Self::Message(m) => &m.username,
            Self::Attachment(a) => &a.username,
            Self::Status(s) => &s.username,
        }
    }
}

/// Chat items in arrival order.
///
/// # Invariants
///
/// - At most one [`ChatItem::Status`] per username. A new notice for a user
///   removes the older one before it is appended.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    items: Vec<ChatItem>,
}

impl ChatLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item, collapsing status notices per user.
    pub fn push(&mut self, item: ChatItem) {
        if let ChatItem::Status(notice) = &item {
            self.items.retain(|existing| {
                !matches!(existing, ChatItem::Status(s) if s.username == notice.username)
            });
        }
        self.items.push(item);
    }

    /// Items in arrival order.
    pub fn items(&self) -> &[ChatItem] {
        &self.items
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Attachments in arrival order.
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter().filter_map(|item| match item {
            ChatItem::Attachment(a) => Some(a),
            _ => None,
        })
    }

    /// The `n`-th attachment (1-based), or the latest when `n` is `None`.
    pub fn attachment(&self, n: Option<usize>) -> Option<&Attachment> {
        match n {
            Some(0) => None,
            Some(n) => self.attachments().nth(n - 1),
            None => self.attachments().last(),
        }
    }

    /// Visible status notice for a user.
    pub fn status_of(&self, username: &str) -> Option<&StatusLine> {
        self.items.iter().find_map(|item| match item {
            ChatItem::Status(s) if s.username == username => Some(s),
            _ => None,
        })
    }
}
