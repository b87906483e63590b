//! Application side-effects and intents.
//!
//! [`AppAction`]s are produced by the [`crate::App`] state machine for the
//! runtime to execute.

use std::path::PathBuf;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Send a chat message.
    SendMessage {
        /// Text as typed
        text: String,
    },

    /// Read a file off the event loop; completion arrives as
    /// [`crate::AppEvent::AttachmentLoaded`] or
    /// [`crate::AppEvent::AttachmentFailed`].
    LoadAttachment {
        /// File to read
        path: PathBuf,
        /// Filename to send
        filename: String,
        /// Media type inferred from the extension
        media_type: String,
    },

    /// Send a loaded attachment.
    SendAttachment {
        /// Original filename
        filename: String,
        /// Declared media type
        media_type: String,
        /// File contents
        data: Vec<u8>,
    },
}
