//! Session state machine.
//!
//! Owns admission to the room and the presence rules that depend on it. Uses
//! the action pattern: every input returns the [`SessionAction`]s the driver
//! must execute, in order. The session never touches the transport itself.
//!
//! # State Machine
//!
//! ```text
//!              connected / reconnected
//!                 (emit join_room)
//!   ┌──────────┐ ─────────────────┐      join_ack      ┌────────┐
//!   │ Unjoined │ <────────────────┘ ──────────────────> │ Joined │
//!   └──────────┘ <───────────────────────────────────── └────────┘
//!        │           disconnected / reconnected              │
//!        │                                                   │
//!        │ username_error{block}       username_error{block} │
//!        ↓                                                   ↓
//!   ┌─────────┐                                              │
//!   │ Blocked │ <────────────────────────────────────────────┘
//!   └─────────┘   (terminal: nothing is ever sent again)
//! ```
//!
//! Without an access code the room is open: admission starts and stays
//! `Joined`, and no `join_room` is ever sent.

use parley_proto::{
    ClientEvent, PresenceStatus,
    events::{JoinAck, JoinRoom, OutgoingImage, OutgoingMessage, StatusUpdate, UsernameError},
};

use crate::error::{MAX_USERNAME_CHARS, SessionError};

/// Whether the server has admitted this client to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admission {
    /// Not (or no longer) admitted
    Unjoined,
    /// Admitted; sends and presence are allowed
    Joined,
    /// Permanently rejected
    Blocked,
}

/// Session's view of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No live connection
    Disconnected,
    /// Transport reports a live connection
    Connected,
}

/// Identity presented to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    access_code: Option<String>,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// The username is trimmed. An empty access code is treated as absent,
    /// which selects the open-room variant.
    ///
    /// # Errors
    ///
    /// - `SessionError::EmptyUsername` if nothing is left after trimming
    /// - `SessionError::UsernameTooLong` past 32 characters
    /// - `SessionError::UsernameControlChar` for any control character
    pub fn new(
        username: impl AsRef<str>,
        access_code: Option<String>,
    ) -> Result<Self, SessionError> {
        let username = username.as_ref().trim();
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }

        let len = username.chars().count();
        if len > MAX_USERNAME_CHARS {
            return Err(SessionError::UsernameTooLong { len, max: MAX_USERNAME_CHARS });
        }

        if let Some(c) = username.chars().find(|c| c.is_control()) {
            return Err(SessionError::UsernameControlChar(c));
        }

        let access_code = access_code.filter(|code| !code.trim().is_empty());

        Ok(Self { username: username.to_string(), access_code })
    }

    /// Display name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Shared room access code. `None` for an open room.
    pub fn access_code(&self) -> Option<&str> {
        self.access_code.as_deref()
    }
}

/// Actions returned by the session state machine.
///
/// The driver executes them in order. `Send` must go out before a following
/// `Disconnect` so that best-effort announcements reach the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Send this event to the server
    Send(ClientEvent),

    /// Allow the user to compose messages
    EnableInput,

    /// Stop the user from composing messages
    DisableInput,

    /// Close the transport and do not reconnect
    Disconnect,

    /// Admission was permanently refused
    Blocked {
        /// Reason given by the server
        reason: String,
    },

    /// Admission was refused for now; the session stays unjoined
    Rejected {
        /// Reason given by the server
        reason: String,
    },
}

/// Session state machine.
///
/// Pure state machine: no I/O and no clock. Transport callbacks and presence
/// intents go in, [`SessionAction`]s come out.
///
/// # Invariants
///
/// - Presence is only announced while `Joined` and `Connected`.
/// - At most one `join_room` is outstanding per connection lifetime.
/// - Once `Blocked`, no method ever returns a `Send`.
/// - An announcement equal to the last announced status is suppressed.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: Credentials,
    admission: Admission,
    connection: ConnectionState,
    /// Last status sent to the server. `None` means unknown.
    last_announced: Option<PresenceStatus>,
    join_pending: bool,
    was_offline: bool,
    input_enabled: bool,
    server_status: Option<String>,
    block_reason: Option<String>,
}

impl Session {
    /// Create a disconnected session.
    ///
    /// With an access code the session starts `Unjoined`; without one it
    /// starts (and stays) `Joined`.
    pub fn new(credentials: Credentials) -> Self {
        let admission =
            if credentials.access_code.is_some() { Admission::Unjoined } else { Admission::Joined };

        Self {
            credentials,
            admission,
            connection: ConnectionState::Disconnected,
            last_announced: None,
            join_pending: false,
            was_offline: false,
            input_enabled: false,
            server_status: None,
            block_reason: None,
        }
    }

    /// Identity presented to the room.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// True when admission is gated by an access code.
    pub fn is_gated(&self) -> bool {
        self.credentials.access_code.is_some()
    }

    /// Current admission state.
    pub fn admission(&self) -> Admission {
        self.admission
    }

    /// Current connection state.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Last status sent to the server. `None` if unknown.
    pub fn last_announced(&self) -> Option<PresenceStatus> {
        self.last_announced
    }

    /// True while a `join_room` awaits an answer.
    pub fn join_pending(&self) -> bool {
        self.join_pending
    }

    /// True when the user may compose messages.
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Status the server reported in the last `join_ack`.
    pub fn server_status(&self) -> Option<&str> {
        self.server_status.as_deref()
    }

    /// Reason for the block. `None` unless `Blocked`.
    pub fn block_reason(&self) -> Option<&str> {
        self.block_reason.as_deref()
    }

    /// Transport connected for the first time.
    pub fn on_connected(&mut self) -> Vec<SessionAction> {
        tracing::info!(username = %self.credentials.username, "transport connected");
        self.begin_lifetime()
    }

    /// Transport reconnected after a drop.
    ///
    /// Local flags are reset and a fresh `join_room` is issued; a `Joined`
    /// session drops back to `Unjoined` before the request goes out.
    pub fn on_reconnected(&mut self) -> Vec<SessionAction> {
        tracing::info!(username = %self.credentials.username, "transport reconnected");
        self.begin_lifetime()
    }

    fn begin_lifetime(&mut self) -> Vec<SessionAction> {
        self.connection = ConnectionState::Connected;

        if self.admission == Admission::Blocked {
            tracing::warn!("connected while blocked, staying silent");
            return vec![SessionAction::Disconnect];
        }

        self.last_announced = None;
        self.was_offline = false;

        let mut actions = Vec::new();

        if !self.is_gated() {
            if !self.input_enabled {
                self.input_enabled = true;
                actions.push(SessionAction::EnableInput);
            }
            actions.extend(self.announce(PresenceStatus::Online));
            return actions;
        }

        if self.admission == Admission::Joined {
            tracing::debug!("rejoining: Joined -> Unjoined");
            self.admission = Admission::Unjoined;
        }
        if self.input_enabled {
            self.input_enabled = false;
            actions.push(SessionAction::DisableInput);
        }

        if !self.join_pending {
            actions.push(self.join_request());
        }

        actions
    }

    /// Transport dropped.
    ///
    /// Announces `Offline` first (best-effort, while the link still counts as
    /// connected), then marks the session disconnected and disables input
    /// until the next connect. A gated session falls back to `Unjoined`.
    pub fn on_disconnected(&mut self) -> Vec<SessionAction> {
        tracing::info!(username = %self.credentials.username, "transport disconnected");

        if self.admission == Admission::Blocked {
            self.connection = ConnectionState::Disconnected;
            return vec![];
        }

        let mut actions = self.announce(PresenceStatus::Offline);

        self.connection = ConnectionState::Disconnected;
        self.join_pending = false;

        if self.is_gated() {
            self.admission = Admission::Unjoined;
        }
        if self.input_enabled {
            self.input_enabled = false;
            actions.push(SessionAction::DisableInput);
        }

        actions
    }

    /// Server acknowledged the join.
    ///
    /// Idempotent: a repeated acknowledgment while `Joined` only clears the
    /// pending flag.
    pub fn on_join_ack(&mut self, ack: &JoinAck) -> Vec<SessionAction> {
        match (self.admission, self.connection) {
            (Admission::Blocked, _) => {
                tracing::warn!("join_ack after block ignored");
                vec![]
            },
            (_, ConnectionState::Disconnected) => {
                tracing::warn!("join_ack while disconnected ignored");
                vec![]
            },
            (Admission::Joined, ConnectionState::Connected) => {
                self.join_pending = false;
                self.server_status = Some(ack.status.clone());
                tracing::debug!("duplicate join_ack");
                vec![]
            },
            (Admission::Unjoined, ConnectionState::Connected) => {
                tracing::info!(username = %ack.username, status = %ack.status, "joined room");
                self.admission = Admission::Joined;
                self.join_pending = false;
                self.server_status = Some(ack.status.clone());

                let mut actions = Vec::new();
                if !self.input_enabled {
                    self.input_enabled = true;
                    actions.push(SessionAction::EnableInput);
                }
                actions.extend(self.announce(PresenceStatus::Online));
                actions
            },
        }
    }

    /// Server refused the username or access code.
    ///
    /// With `block` set the session becomes `Blocked` for good: input is
    /// disabled and the transport is closed. Without it the refusal is
    /// surfaced and the session stays where it is until the next connection.
    pub fn on_username_error(&mut self, error: &UsernameError) -> Vec<SessionAction> {
        if self.admission == Admission::Blocked {
            return vec![];
        }

        self.join_pending = false;

        if !error.block {
            tracing::warn!(reason = %error.message, "join refused");
            return vec![SessionAction::Rejected { reason: error.message.clone() }];
        }

        tracing::warn!(reason = %error.message, "blocked by server");
        self.admission = Admission::Blocked;
        self.block_reason = Some(error.message.clone());
        self.input_enabled = false;

        vec![
            SessionAction::DisableInput,
            SessionAction::Disconnect,
            SessionAction::Blocked { reason: error.message.clone() },
        ]
    }

    /// Announce a presence status if it is allowed and changes anything.
    ///
    /// Suppressed unless `Joined` and `Connected`, and whenever `status`
    /// equals the last announced value. Going `Online` after an `Offline`
    /// announcement in a gated room first refreshes the join, since the
    /// server may have evicted an idle client.
    pub fn announce(&mut self, status: PresenceStatus) -> Vec<SessionAction> {
        if self.admission != Admission::Joined || self.connection != ConnectionState::Connected {
            tracing::debug!(%status, admission = ?self.admission, "announcement suppressed");
            return vec![];
        }

        if self.last_announced == Some(status) {
            return vec![];
        }

        let mut actions = Vec::new();

        if status == PresenceStatus::Online
            && self.was_offline
            && self.is_gated()
            && !self.join_pending
        {
            tracing::debug!("refreshing join after offline period");
            actions.push(self.join_request());
        }

        self.was_offline = status == PresenceStatus::Offline;
        self.last_announced = Some(status);
        tracing::debug!(%status, "announcing presence");

        actions.push(SessionAction::Send(ClientEvent::Status(StatusUpdate {
            username: self.credentials.username.clone(),
            status,
            security_code: self.credentials.access_code.clone(),
        })));

        actions
    }

    /// Build an outbound chat message.
    ///
    /// # Errors
    ///
    /// - `SessionError::Blocked` if the session is blocked
    /// - `SessionError::NotJoined` if not admitted
    /// - `SessionError::Disconnected` if the transport is down
    pub fn compose_message(
        &self,
        message: String,
        timestamp: String,
    ) -> Result<ClientEvent, SessionError> {
        self.ensure_can_send()?;
        Ok(ClientEvent::Message(OutgoingMessage {
            username: self.credentials.username.clone(),
            message,
            timestamp,
            security_code: self.credentials.access_code.clone(),
        }))
    }

    /// Build an outbound image attachment.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Session::compose_message`].
    pub fn compose_image(
        &self,
        image_data: Vec<u8>,
        filename: String,
        mime_type: String,
    ) -> Result<ClientEvent, SessionError> {
        self.ensure_can_send()?;
        Ok(ClientEvent::Image(OutgoingImage {
            username: self.credentials.username.clone(),
            image_data,
            filename,
            mime_type,
            security_code: self.credentials.access_code.clone(),
        }))
    }

    fn ensure_can_send(&self) -> Result<(), SessionError> {
        match (self.admission, self.connection) {
            (Admission::Blocked, _) => Err(SessionError::Blocked {
                reason: self.block_reason.clone().unwrap_or_default(),
            }),
            (Admission::Unjoined, _) => {
                Err(SessionError::NotJoined { admission: self.admission })
            },
            (Admission::Joined, ConnectionState::Disconnected) => Err(SessionError::Disconnected),
            (Admission::Joined, ConnectionState::Connected) => Ok(()),
        }
    }

    /// Tear the session down (quit).
    ///
    /// Sends a best-effort `Offline`, asks for the transport to close, and
    /// resets to `Unjoined`/`Disconnected`. A block survives teardown.
    pub fn teardown(&mut self) -> Vec<SessionAction> {
        let mut actions = self.announce(PresenceStatus::Offline);
        actions.push(SessionAction::Disconnect);

        if self.admission != Admission::Blocked {
            self.admission = Admission::Unjoined;
        }
        self.connection = ConnectionState::Disconnected;
        self.last_announced = None;
        self.join_pending = false;
        self.was_offline = false;
        if self.input_enabled {
            self.input_enabled = false;
            actions.push(SessionAction::DisableInput);
        }

        actions
    }

    fn join_request(&mut self) -> SessionAction {
        self.join_pending = true;
        tracing::debug!(username = %self.credentials.username, "requesting join");
        SessionAction::Send(ClientEvent::JoinRoom(JoinRoom {
            username: self.credentials.username.clone(),
            security_code: self.credentials.access_code.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gated() -> Session {
        Session::new(Credentials::new("alice", Some("s3cret".into())).unwrap())
    }

    fn open() -> Session {
        Session::new(Credentials::new("alice", None).unwrap())
    }

    fn ack() -> JoinAck {
        JoinAck { username: "alice".into(), status: "online".into() }
    }

    fn joined() -> Session {
        let mut session = gated();
        let _ = session.on_connected();
        let _ = session.on_join_ack(&ack());
        session
    }

    fn sent(actions: &[SessionAction]) -> Vec<&ClientEvent> {
        actions
            .iter()
            .filter_map(|a| match a {
                SessionAction::Send(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn credentials_validation() {
        assert_eq!(Credentials::new("   ", None), Err(SessionError::EmptyUsername));
        assert!(matches!(
            Credentials::new("x".repeat(33), None),
            Err(SessionError::UsernameTooLong { len: 33, max: 32 })
        ));
        assert_eq!(Credentials::new("a\tb", None), Err(SessionError::UsernameControlChar('\t')));

        let creds = Credentials::new("  bob ", Some(String::new())).unwrap();
        assert_eq!(creds.username(), "bob");
        assert_eq!(creds.access_code(), None);
    }

    #[test]
    fn connect_requests_join() {
        let mut session = gated();
        let actions = session.on_connected();

        assert!(matches!(actions.as_slice(), [SessionAction::Send(ClientEvent::JoinRoom(j))]
            if j.security_code.as_deref() == Some("s3cret")));
        assert_eq!(session.admission(), Admission::Unjoined);
        assert!(session.join_pending());
    }

    #[test]
    fn ack_joins_and_announces_online() {
        let mut session = gated();
        let _ = session.on_connected();
        let actions = session.on_join_ack(&ack());

        assert!(matches!(actions.as_slice(), [
            SessionAction::EnableInput,
            SessionAction::Send(ClientEvent::Status(StatusUpdate {
                status: PresenceStatus::Online,
                ..
            }))
        ]));
        assert_eq!(session.admission(), Admission::Joined);
        assert_eq!(session.server_status(), Some("online"));
        assert!(!session.join_pending());
    }

    #[test]
    fn repeated_ack_is_noop() {
        let mut session = joined();
        let actions = session.on_join_ack(&ack());
        assert!(actions.is_empty());
        assert!(session.input_enabled());
    }

    #[test]
    fn ack_while_disconnected_ignored() {
        let mut session = gated();
        assert!(session.on_join_ack(&ack()).is_empty());
        assert_eq!(session.admission(), Admission::Unjoined);
    }

    #[test]
    fn block_is_terminal() {
        let mut session = joined();
        let actions = session.on_username_error(&UsernameError {
            message: "wrong code".into(),
            block: true,
        });

        assert!(matches!(actions.as_slice(), [
            SessionAction::DisableInput,
            SessionAction::Disconnect,
            SessionAction::Blocked { .. }
        ]));
        assert_eq!(session.admission(), Admission::Blocked);
        assert_eq!(session.block_reason(), Some("wrong code"));

        assert!(sent(&session.announce(PresenceStatus::Offline)).is_empty());
        assert!(sent(&session.on_disconnected()).is_empty());
        assert!(sent(&session.on_reconnected()).is_empty());
        assert!(sent(&session.on_join_ack(&ack())).is_empty());
        assert!(sent(&session.teardown()).is_empty());
        assert!(matches!(
            session.compose_message("hi".into(), String::new()),
            Err(SessionError::Blocked { .. })
        ));
        assert_eq!(session.admission(), Admission::Blocked);
    }

    #[test]
    fn soft_rejection_keeps_session_unjoined() {
        let mut session = gated();
        let _ = session.on_connected();
        let actions = session.on_username_error(&UsernameError {
            message: "name taken".into(),
            block: false,
        });

        assert!(matches!(actions.as_slice(), [SessionAction::Rejected { .. }]));
        assert_eq!(session.admission(), Admission::Unjoined);
        assert!(!session.join_pending());
    }

    #[test]
    fn disconnect_announces_offline_then_unjoins() {
        let mut session = joined();
        let actions = session.on_disconnected();

        assert!(matches!(actions.as_slice(), [
            SessionAction::Send(ClientEvent::Status(StatusUpdate {
                status: PresenceStatus::Offline,
                ..
            })),
            SessionAction::DisableInput
        ]));
        assert_eq!(session.admission(), Admission::Unjoined);
        assert_eq!(session.connection(), ConnectionState::Disconnected);
    }

    #[test]
    fn reconnect_rejoins_exactly_once() {
        let mut session = joined();
        let actions = session.on_reconnected();

        let joins = sent(&actions)
            .into_iter()
            .filter(|e| matches!(e, ClientEvent::JoinRoom(_)))
            .count();
        assert_eq!(joins, 1);
        assert!(matches!(actions.first(), Some(SessionAction::DisableInput)));
        assert_eq!(session.admission(), Admission::Unjoined);

        // A second reconnect in the same lifetime must not pile up requests.
        assert!(sent(&session.on_reconnected()).is_empty());
    }

    #[test]
    fn duplicate_status_suppressed() {
        let mut session = joined();
        assert!(session.announce(PresenceStatus::Online).is_empty());
        assert_eq!(sent(&session.announce(PresenceStatus::Offline)).len(), 1);
        assert!(session.announce(PresenceStatus::Offline).is_empty());
    }

    #[test]
    fn online_after_offline_refreshes_join() {
        let mut session = joined();
        let _ = session.announce(PresenceStatus::Offline);
        let actions = session.announce(PresenceStatus::Online);

        assert!(matches!(actions.as_slice(), [
            SessionAction::Send(ClientEvent::JoinRoom(_)),
            SessionAction::Send(ClientEvent::Status(_))
        ]));
        assert_eq!(session.admission(), Admission::Joined);

        // The refresh ack only clears the pending flag.
        assert!(session.on_join_ack(&ack()).is_empty());
        assert!(!session.join_pending());
    }

    #[test]
    fn open_room_never_joins() {
        let mut session = open();
        assert_eq!(session.admission(), Admission::Joined);

        let actions = session.on_connected();
        assert!(matches!(actions.as_slice(), [
            SessionAction::EnableInput,
            SessionAction::Send(ClientEvent::Status(StatusUpdate { security_code: None, .. }))
        ]));

        let _ = session.announce(PresenceStatus::Offline);
        let actions = session.announce(PresenceStatus::Online);
        assert!(sent(&actions).iter().all(|e| !matches!(e, ClientEvent::JoinRoom(_))));

        let _ = session.on_disconnected();
        assert_eq!(session.admission(), Admission::Joined);
    }

    #[test]
    fn open_room_input_follows_the_link() {
        let mut session = open();
        assert!(!session.input_enabled());

        let _ = session.on_connected();
        assert!(session.input_enabled());

        let actions = session.on_disconnected();
        assert!(matches!(actions.as_slice(), [
            SessionAction::Send(ClientEvent::Status(StatusUpdate {
                status: PresenceStatus::Offline,
                ..
            })),
            SessionAction::DisableInput
        ]));
        assert!(!session.input_enabled());
        assert_eq!(session.admission(), Admission::Joined);

        let actions = session.on_reconnected();
        assert!(matches!(actions.first(), Some(SessionAction::EnableInput)));
        assert!(session.input_enabled());
    }

    #[test]
    fn compose_requires_joined_and_connected() {
        let session = gated();
        assert_eq!(
            session.compose_message("hi".into(), String::new()),
            Err(SessionError::NotJoined { admission: Admission::Unjoined })
        );

        let session = open();
        assert_eq!(
            session.compose_message("hi".into(), String::new()),
            Err(SessionError::Disconnected)
        );

        let session = joined();
        let event = session.compose_image(vec![1, 2, 3], "a.png".into(), "image/png".into());
        assert!(matches!(event, Ok(ClientEvent::Image(img)) if img.image_data.len() == 3));
    }

    #[test]
    fn teardown_resets() {
        let mut session = joined();
        let actions = session.teardown();

        assert!(matches!(actions.as_slice(), [
            SessionAction::Send(ClientEvent::Status(StatusUpdate {
                status: PresenceStatus::Offline,
                ..
            })),
            SessionAction::Disconnect,
            SessionAction::DisableInput
        ]));
        assert_eq!(session.admission(), Admission::Unjoined);
        assert_eq!(session.connection(), ConnectionState::Disconnected);
        assert_eq!(session.last_announced(), None);
    }
}
