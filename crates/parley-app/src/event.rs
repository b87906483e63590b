//! Application input events.
//!
//! Events originate from three sources:
//! - The terminal: keys, resize, focus changes, ticks.
//! - The transport: lifecycle notifications.
//! - The [`crate::Dispatcher`]: chat items, session changes and notices
//!   derived from server frames and local sends.

use parley_client::TransportEvent;

use crate::{ChatItem, KeyInput, SessionView};

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Terminal gained focus.
    FocusGained,

    /// Terminal lost focus.
    FocusLost,

    /// Transport lifecycle notification.
    Transport(TransportEvent),

    /// Session admission or input state changed.
    Session(SessionView),

    /// New chat item.
    Item(ChatItem),

    /// File read for an attachment completed.
    AttachmentLoaded {
        /// Original filename
        filename: String,
        /// Media type inferred from the extension
        media_type: String,
        /// File contents
        data: Vec<u8>,
    },

    /// File read for an attachment failed.
    AttachmentFailed {
        /// Path that could not be read
        path: String,
        /// Error description
        error: String,
    },

    /// Non-blocking notice for the status line.
    Notice {
        /// Notice text
        message: String,
    },
}
