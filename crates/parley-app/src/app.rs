//! Application state machine.
//!
//! [`App`] is the view model of the client, decoupled from I/O and from the
//! session rules. It consumes [`crate::AppEvent`]s and produces
//! [`crate::AppAction`]s for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns the chat log, the composer line and the attachment viewer.
//! - Mirrors transport and session state for the status line.
//! - Refuses sends while the session has input disabled, leaving the composer
//!   untouched.

use parley_core::Admission;

use crate::{
    AppAction, AppEvent, ChatLog, InputState, KeyInput, LinkStatus, SessionView,
    commands::{self, Command},
    media::{self, Preview},
};

/// Open attachment viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    number: usize,
    preview: Preview,
}

impl Modal {
    /// 1-based attachment number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// What is being shown.
    pub fn preview(&self) -> &Preview {
        &self.preview
    }
}

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies, fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    server_addr: String,
    username: String,
    link: LinkStatus,
    session: SessionView,
    focused: bool,
    chat: ChatLog,
    composer: InputState,
    /// Attachment viewer. `None` when closed.
    modal: Option<Modal>,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Latest notice. `None` until something happens worth telling.
    notice: Option<String>,
}

impl App {
    /// Create an App for the given server and username.
    pub fn new(server_addr: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            username: username.into(),
            link: LinkStatus::Connecting,
            session: SessionView::default(),
            focused: true,
            chat: ChatLog::new(),
            composer: InputState::new(),
            modal: None,
            terminal_size: (80, 24),
            notice: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::FocusGained => {
                self.focused = true;
                vec![AppAction::Render]
            },
            AppEvent::FocusLost => {
                self.focused = false;
                vec![AppAction::Render]
            },
            AppEvent::Transport(event) => {
                self.link = self.link.after(&event);
                match event {
                    parley_client::TransportEvent::ConnectError { message } => {
                        self.notice = Some(format!("Connection failed: {message}"));
                    },
                    parley_client::TransportEvent::ConnectTimeout => {
                        self.notice = Some("Connection timed out".to_string());
                    },
                    parley_client::TransportEvent::ReconnectFailed => {
                        self.notice = Some("Could not reconnect; restart to try again".to_string());
                    },
                    _ => {},
                }
                vec![AppAction::Render]
            },
            AppEvent::Session(view) => {
                if let Some(reason) = &view.block_reason
                    && self.session.block_reason.is_none()
                {
                    self.notice = Some(format!("Blocked: {reason}"));
                }
                self.session = view;
                vec![AppAction::Render]
            },
            AppEvent::Item(item) => {
                self.chat.push(item);
                vec![AppAction::Render]
            },
            AppEvent::AttachmentLoaded { filename, media_type, data } => {
                self.notice = Some(format!("Sending {filename}"));
                vec![AppAction::SendAttachment { filename, media_type, data }, AppAction::Render]
            },
            AppEvent::AttachmentFailed { path, error } => {
                self.notice = Some(format!("Could not read {path}: {error}"));
                vec![AppAction::Render]
            },
            AppEvent::Notice { message } => {
                self.notice = Some(message);
                vec![AppAction::Render]
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        if self.modal.is_some() {
            if key == KeyInput::Esc {
                self.modal = None;
                return vec![AppAction::Render];
            }
            return vec![];
        }

        match key {
            KeyInput::Esc => vec![AppAction::Quit],
            KeyInput::Enter => self.handle_enter(),
            other => {
                if self.composer.apply(other) {
                    vec![AppAction::Render]
                } else {
                    vec![]
                }
            },
        }
    }

    /// Parse the composer line and act on it.
    ///
    /// A blank line does nothing and stays in the composer. Sends are refused
    /// while input is disabled, also leaving the composer as typed.
    fn handle_enter(&mut self) -> Vec<AppAction> {
        if self.composer.is_blank() {
            return vec![];
        }

        match commands::parse(self.composer.buffer()) {
            Command::Message { text } => {
                if !self.session.input_enabled {
                    return self.refuse_send();
                }
                self.composer.take();
                vec![AppAction::SendMessage { text }, AppAction::Render]
            },
            Command::Image { path } => {
                if !self.session.input_enabled {
                    return self.refuse_send();
                }
                self.composer.take();
                let filename = media::file_name(&path);
                let media_type = media::infer(&path).to_string();
                self.notice = Some(format!("Reading {filename}"));
                vec![AppAction::LoadAttachment { path, filename, media_type }, AppAction::Render]
            },
            Command::View { index } => {
                self.composer.take();
                self.open_viewer(index)
            },
            Command::Quit => vec![AppAction::Quit],
            Command::Unknown { input } => {
                self.composer.take();
                self.notice = Some(format!("Unknown command: /{input}"));
                vec![AppAction::Render]
            },
            Command::InvalidArgs { command, error } => {
                self.composer.take();
                self.notice = Some(format!("/{command}: {error}"));
                vec![AppAction::Render]
            },
        }
    }

    fn refuse_send(&mut self) -> Vec<AppAction> {
        self.notice = Some(match (&self.session.admission, &self.session.block_reason) {
            (Admission::Blocked, Some(reason)) => format!("Blocked: {reason}"),
            (Admission::Blocked, None) => "Blocked by the server".to_string(),
            (Admission::Joined, _) => "Not connected".to_string(),
            (Admission::Unjoined, _) => "Not in the room yet".to_string(),
        });
        vec![AppAction::Render]
    }

    /// Open the `n`-th attachment (1-based), or the latest.
    pub fn open_viewer(&mut self, index: Option<usize>) -> Vec<AppAction> {
        let Some(attachment) = self.chat.attachment(index) else {
            self.notice = Some(match index {
                Some(n) => format!("No attachment #{n}"),
                None => "No attachments yet".to_string(),
            });
            return vec![AppAction::Render];
        };

        let number = index.unwrap_or_else(|| self.chat.attachments().count());
        self.modal = Some(Modal { number, preview: Preview::decode(attachment) });
        vec![AppAction::Render]
    }

    /// Close the attachment viewer, dropping its preview.
    pub fn close_viewer(&mut self) -> Vec<AppAction> {
        if self.modal.take().is_some() { vec![AppAction::Render] } else { vec![] }
    }

    /// Set a notice for the status line.
    pub fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// Server address (host:port).
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Local username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Transport state.
    pub fn link(&self) -> &LinkStatus {
        &self.link
    }

    /// Session state.
    pub fn session(&self) -> &SessionView {
        &self.session
    }

    /// Terminal has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Chat log.
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Composer line.
    pub fn composer(&self) -> &InputState {
        &self.composer
    }

    /// Attachment viewer. `None` when closed.
    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Latest notice. `None` if nothing to report.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use parley_client::TransportEvent;

    use super::*;
    use crate::{Attachment, ChatItem};

    fn joined_app() -> App {
        let mut app = App::new("localhost:4433", "alice");
        let _ = app.handle(AppEvent::Session(SessionView {
            admission: Admission::Joined,
            input_enabled: true,
            block_reason: None,
        }));
        app
    }

    fn type_line(app: &mut App, line: &str) -> Vec<AppAction> {
        for c in line.chars() {
            let _ = app.handle(AppEvent::Key(KeyInput::Char(c)));
        }
        app.handle(AppEvent::Key(KeyInput::Enter))
    }

    fn attachment(filename: &str) -> ChatItem {
        ChatItem::Attachment(Attachment {
            username: "bob".into(),
            data: vec![1, 2, 3],
            filename: filename.into(),
            media_type: "image/png".into(),
            timestamp: None,
        })
    }

    #[test]
    fn enter_sends_and_clears() {
        let mut app = joined_app();
        let actions = type_line(&mut app, "hello");

        assert_eq!(actions, vec![
            AppAction::SendMessage { text: "hello".into() },
            AppAction::Render
        ]);
        assert_eq!(app.composer().buffer(), "");
    }

    #[test]
    fn whitespace_is_a_no_op() {
        let mut app = joined_app();
        let actions = type_line(&mut app, "   ");

        assert!(actions.is_empty());
        assert_eq!(app.composer().buffer(), "   ");
    }

    #[test]
    fn send_refused_until_joined() {
        let mut app = App::new("localhost:4433", "alice");
        let actions = type_line(&mut app, "hello");

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.composer().buffer(), "hello");
        assert_eq!(app.notice(), Some("Not in the room yet"));
    }

    #[test]
    fn send_refused_while_the_link_is_down() {
        let mut app = joined_app();
        let _ = app.handle(AppEvent::Session(SessionView {
            admission: Admission::Joined,
            input_enabled: false,
            block_reason: None,
        }));

        let actions = type_line(&mut app, "important");

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.composer().buffer(), "important");
        assert_eq!(app.notice(), Some("Not connected"));
    }

    #[test]
    fn blocked_session_reports_reason() {
        let mut app = joined_app();
        let _ = app.handle(AppEvent::Session(SessionView {
            admission: Admission::Blocked,
            input_enabled: false,
            block_reason: Some("wrong code".into()),
        }));
        assert_eq!(app.notice(), Some("Blocked: wrong code"));

        let _ = type_line(&mut app, "hi");
        assert_eq!(app.composer().buffer(), "hi");
    }

    #[test]
    fn image_command_requests_load() {
        let mut app = joined_app();
        let actions = type_line(&mut app, "/image /tmp/cat.JPG");

        assert_eq!(actions, vec![
            AppAction::LoadAttachment {
                path: PathBuf::from("/tmp/cat.JPG"),
                filename: "cat.JPG".into(),
                media_type: "image/jpeg".into(),
            },
            AppAction::Render
        ]);
    }

    #[test]
    fn loaded_attachment_is_sent() {
        let mut app = joined_app();
        let actions = app.handle(AppEvent::AttachmentLoaded {
            filename: "cat.png".into(),
            media_type: "image/png".into(),
            data: vec![9, 9],
        });
        assert!(matches!(actions.first(), Some(AppAction::SendAttachment { data, .. }) if data == &[9, 9]));
    }

    #[test]
    fn failed_read_is_a_notice() {
        let mut app = joined_app();
        let _ = app.handle(AppEvent::AttachmentFailed {
            path: "/nope.png".into(),
            error: "not found".into(),
        });
        assert_eq!(app.notice(), Some("Could not read /nope.png: not found"));
        assert!(app.session().input_enabled);
    }

    #[test]
    fn viewer_opens_and_esc_closes_without_quitting() {
        let mut app = joined_app();
        let _ = app.handle(AppEvent::Item(attachment("a.png")));
        let _ = app.handle(AppEvent::Item(attachment("b.png")));

        let _ = type_line(&mut app, "/view");
        let modal = app.modal().unwrap();
        assert_eq!(modal.number(), 2);
        assert_eq!(modal.preview().filename, "b.png");

        // Typing is ignored while the viewer is open.
        assert!(app.handle(AppEvent::Key(KeyInput::Char('x'))).is_empty());

        assert_eq!(app.handle(AppEvent::Key(KeyInput::Esc)), vec![AppAction::Render]);
        assert!(app.modal().is_none());

        assert_eq!(app.handle(AppEvent::Key(KeyInput::Esc)), vec![AppAction::Quit]);
    }

    #[test]
    fn viewer_by_number() {
        let mut app = joined_app();
        let _ = app.handle(AppEvent::Item(attachment("a.png")));

        let _ = type_line(&mut app, "/view 1");
        assert_eq!(app.modal().map(|m| m.preview().filename.as_str()), Some("a.png"));

        let _ = app.close_viewer();
        let _ = type_line(&mut app, "/view 4");
        assert!(app.modal().is_none());
        assert_eq!(app.notice(), Some("No attachment #4"));
    }

    #[test]
    fn quit_command() {
        let mut app = App::new("localhost:4433", "alice");
        assert_eq!(type_line(&mut app, "/quit"), vec![AppAction::Quit]);
    }

    #[test]
    fn transport_events_update_link() {
        let mut app = App::new("localhost:4433", "alice");
        assert_eq!(app.link(), &LinkStatus::Connecting);

        let _ = app.handle(AppEvent::Transport(TransportEvent::ConnectTimeout));
        assert_eq!(app.notice(), Some("Connection timed out"));

        let _ = app.handle(AppEvent::Transport(TransportEvent::Connected));
        assert_eq!(app.link(), &LinkStatus::Connected);
    }

    #[test]
    fn focus_tracked() {
        let mut app = App::new("localhost:4433", "alice");
        let _ = app.handle(AppEvent::FocusLost);
        assert!(!app.is_focused());
        let _ = app.handle(AppEvent::FocusGained);
        assert!(app.is_focused());
    }
}
