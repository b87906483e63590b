//! Message/attachment dispatcher.
//!
//! The [`Dispatcher`] owns the [`Session`] and the [`PresenceBroadcaster`] and
//! sits between the App and the wire.
//!
//! # Responsibilities
//!
//! - Serializes outgoing chat and image payloads with the session
//!   credentials, only while the session allows sends.
//! - Decodes inbound frames: admission replies go to the session, chat,
//!   image and status events become [`ChatItem`]s.
//! - Feeds transport lifecycle and focus/liveness signals into the session.
//! - Accumulates outgoing [`Frame`]s for the driver to send in the next I/O
//!   cycle, and records when the session asks for the link to close.
//!
//! Malformed inbound data never stops the stream: the frame or field is
//! skipped or replaced by a placeholder and logged.

use parley_client::TransportEvent;
use parley_core::{
    Credentials, Environment, PresenceBroadcaster, PresenceConfig, Session, SessionAction,
};
use parley_proto::{
    Frame, PresenceStatus, ProtocolError, ServerEvent,
    events::{IncomingImage, IncomingMessage, StatusNotice},
};

use crate::{
    AppAction, AppEvent, Attachment, ChatItem, Message, SessionView, StatusLine,
    media::{self, FALLBACK_MEDIA_TYPE},
    timestamp,
};

/// Bridge between the App and the session rules.
///
/// Generic over Environment to support both production and simulation.
pub struct Dispatcher<E: Environment> {
    env: E,
    session: Session,
    presence: PresenceBroadcaster<E::Instant>,
    outgoing: Vec<Frame>,
    disconnect_requested: bool,
    view: SessionView,
}

impl<E: Environment> Dispatcher<E> {
    /// Create a dispatcher for a fresh, disconnected session.
    pub fn new(env: E, credentials: Credentials, presence: &PresenceConfig) -> Self {
        let now = env.now();
        let session = Session::new(credentials);
        let view = SessionView::of(&session);
        Self {
            presence: PresenceBroadcaster::new(presence, now),
            env,
            session,
            outgoing: Vec::new(),
            disconnect_requested: false,
            view,
        }
    }

    /// Session state (read-only).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Presence broadcaster state (read-only).
    pub fn presence(&self) -> &PresenceBroadcaster<E::Instant> {
        &self.presence
    }

    /// Current session view. Also sent as [`AppEvent::Session`] whenever it
    /// changes.
    pub fn view(&self) -> &SessionView {
        &self.view
    }

    /// Take pending outgoing frames.
    pub fn take_outgoing(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.outgoing)
    }

    /// True once since the session last asked for the transport to close.
    pub fn take_disconnect(&mut self) -> bool {
        std::mem::take(&mut self.disconnect_requested)
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::SendMessage { text } => self.send_message(&text),
            AppAction::SendAttachment { filename, media_type, data } => {
                self.send_attachment(data, filename, media_type)
            },
            AppAction::Render | AppAction::Quit | AppAction::LoadAttachment { .. } => vec![],
        }
    }

    /// Send a chat message as typed. Blank text is ignored.
    pub fn send_message(&mut self, text: &str) -> Vec<AppEvent> {
        if text.trim().is_empty() {
            return vec![];
        }

        let stamp = timestamp::outgoing(self.env.wall_clock());
        match self.session.compose_message(text.to_string(), stamp) {
            Ok(event) => match self.queue(event) {
                Ok(()) => vec![],
                Err(e) => vec![AppEvent::Notice { message: format!("Not sent: {e}") }],
            },
            Err(e) => {
                tracing::debug!(error = %e, "message suppressed");
                vec![AppEvent::Notice { message: format!("Not sent: {e}") }]
            },
        }
    }

    /// Send a loaded attachment.
    ///
    /// An attachment that does not fit in one frame is refused with a notice.
    pub fn send_attachment(
        &mut self,
        data: Vec<u8>,
        filename: String,
        media_type: String,
    ) -> Vec<AppEvent> {
        let size = data.len();
        let name = filename.clone();
        match self.session.compose_image(data, filename, media_type) {
            Ok(event) => match self.queue(event) {
                Ok(()) => {
                    tracing::debug!(size, "attachment queued");
                    vec![]
                },
                Err(ProtocolError::PayloadTooLarge { max, .. }) => vec![AppEvent::Notice {
                    message: format!(
                        "Not sent: {name} is too large ({size} bytes, limit {max} bytes)"
                    ),
                }],
                Err(e) => vec![AppEvent::Notice { message: format!("Not sent: {e}") }],
            },
            Err(e) => {
                tracing::debug!(error = %e, "attachment suppressed");
                vec![AppEvent::Notice { message: format!("Not sent: {e}") }]
            },
        }
    }

    /// Handle a transport lifecycle notification.
    pub fn handle_transport(&mut self, event: &TransportEvent) -> Vec<AppEvent> {
        let actions = match event {
            TransportEvent::Connected => self.session.on_connected(),
            TransportEvent::Reconnected { .. } => self.session.on_reconnected(),
            TransportEvent::Disconnected { .. } => self.session.on_disconnected(),
            TransportEvent::Reconnecting { .. }
            | TransportEvent::ConnectError { .. }
            | TransportEvent::ConnectTimeout
            | TransportEvent::ReconnectFailed => vec![],
        };
        self.apply(actions)
    }

    /// Handle a frame from the server.
    pub fn handle_frame(&mut self, frame: &Frame) -> Vec<AppEvent> {
        let event = match ServerEvent::from_frame(frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    kind = frame.header.kind(),
                    recoverable = e.is_recoverable(),
                    error = %e,
                    "dropping undecodable frame"
                );
                return vec![];
            },
        };

        match event {
            ServerEvent::JoinAck(ack) => {
                let actions = self.session.on_join_ack(&ack);
                self.apply(actions)
            },
            ServerEvent::UsernameError(error) => {
                let actions = self.session.on_username_error(&error);
                self.apply(actions)
            },
            ServerEvent::Message(message) => vec![AppEvent::Item(self.message_item(message))],
            ServerEvent::Image(image) => vec![AppEvent::Item(self.attachment_item(image))],
            ServerEvent::UserStatus(notice) => vec![AppEvent::Item(self.status_item(notice))],
        }
    }

    /// Focus gained.
    pub fn handle_focus(&mut self) -> Vec<AppEvent> {
        let now = self.env.now();
        let intent = self.presence.on_focus(now);
        self.announce(intent)
    }

    /// Focus lost.
    pub fn handle_blur(&mut self) -> Vec<AppEvent> {
        let intent = self.presence.on_blur();
        self.announce(intent)
    }

    /// Process a time tick.
    pub fn handle_tick(&mut self, now: E::Instant) -> Vec<AppEvent> {
        let intent = self.presence.on_tick(now);
        self.announce(intent)
    }

    /// Tear the session down on quit: best-effort Offline, then close.
    pub fn teardown(&mut self) -> Vec<AppEvent> {
        self.presence.shutdown();
        let actions = self.session.teardown();
        self.apply(actions)
    }

    fn announce(&mut self, intent: Option<PresenceStatus>) -> Vec<AppEvent> {
        match intent {
            Some(status) => {
                let actions = self.session.announce(status);
                self.apply(actions)
            },
            None => vec![],
        }
    }

    fn apply(&mut self, actions: Vec<SessionAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                SessionAction::Send(event) => {
                    let _ = self.queue(event);
                },
                SessionAction::EnableInput | SessionAction::DisableInput => {},
                SessionAction::Disconnect => self.disconnect_requested = true,
                SessionAction::Blocked { reason } => {
                    tracing::info!(%reason, "session blocked");
                    self.presence.shutdown();
                },
                SessionAction::Rejected { reason } => {
                    events.push(AppEvent::Notice { message: format!("Join rejected: {reason}") });
                },
            }
        }

        let view = SessionView::of(&self.session);
        if view != self.view {
            self.view = view.clone();
            events.insert(0, AppEvent::Session(view));
        }

        events
    }

    fn queue(&mut self, event: parley_proto::ClientEvent) -> Result<(), ProtocolError> {
        let kind = event.kind();
        match event.into_frame() {
            Ok(frame) => {
                self.outgoing.push(frame);
                Ok(())
            },
            Err(e) => {
                tracing::warn!(?kind, error = %e, "cannot encode outgoing event");
                Err(e)
            },
        }
    }

    fn message_item(&self, message: IncomingMessage) -> ChatItem {
        let timestamp = self.inbound_timestamp(&message.timestamp);
        ChatItem::Message(Message { username: message.username, text: message.message, timestamp })
    }

    fn attachment_item(&self, image: IncomingImage) -> ChatItem {
        let timestamp = self.inbound_timestamp(&image.timestamp);
        let media_type = media::normalize(&image.mime_type).unwrap_or_else(|| {
            tracing::warn!(
                declared = %image.mime_type,
                filename = %image.filename,
                "unusable media type"
            );
            FALLBACK_MEDIA_TYPE.to_string()
        });

        ChatItem::Attachment(Attachment {
            username: image.username,
            data: image.image_data,
            filename: image.filename,
            media_type,
            timestamp,
        })
    }

    fn status_item(&self, notice: StatusNotice) -> ChatItem {
        ChatItem::Status(StatusLine {
            username: notice.username,
            status: notice.status,
            timestamp: Some(self.env.wall_clock().naive_utc()),
        })
    }

    fn inbound_timestamp(&self, raw: &str) -> Option<chrono::NaiveDateTime> {
        let parsed = timestamp::parse(raw);
        if parsed.is_none() {
            tracing::warn!(raw, "unparseable timestamp");
        }
        parsed
    }
}
