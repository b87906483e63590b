//! Observable state extracted for invariant checking.

use std::collections::HashMap;

use parley_app::{App, ChatItem, Dispatcher, SessionView};
use parley_core::{Admission, ConnectionState, Environment, Session};
use parley_proto::{ClientEvent, PresenceStatus};

/// Session state observed before a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorState {
    /// Admission before the step
    pub admission: Admission,
    /// Joined and connected before the step
    pub could_send: bool,
}

impl PriorState {
    /// Observe a session.
    pub fn of(session: &Session) -> Self {
        Self { admission: session.admission(), could_send: can_send(session) }
    }
}

/// Snapshot of one client after a step, plus what it sent during the step.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// State before the step
    pub prior: PriorState,
    /// Configured username
    pub username: String,
    /// Configured access code
    pub access_code: Option<String>,
    /// Session admission
    pub admission: Admission,
    /// Session's view of the transport
    pub connection: ConnectionState,
    /// Session allows sends
    pub input_enabled: bool,
    /// Block reason, if blocked
    pub block_reason: Option<String>,
    /// Last presence status announced
    pub last_announced: Option<PresenceStatus>,
    /// A join request is outstanding
    pub join_pending: bool,
    /// Session state as the App sees it
    pub view: SessionView,
    /// Status notices in the chat log, per username
    pub status_notices: HashMap<String, usize>,
    /// Events the client put on the wire during the step
    pub outbound: Vec<ClientEvent>,
}

impl SessionSnapshot {
    /// Capture the state of an App and its Dispatcher.
    pub fn capture<E: Environment>(
        prior: PriorState,
        app: &App,
        dispatcher: &Dispatcher<E>,
        outbound: Vec<ClientEvent>,
    ) -> Self {
        let session = dispatcher.session();

        let mut status_notices = HashMap::new();
        for item in app.chat().items() {
            if let ChatItem::Status(status) = item {
                *status_notices.entry(status.username.clone()).or_insert(0) += 1;
            }
        }

        Self {
            prior,
            username: session.credentials().username().to_string(),
            access_code: session.credentials().access_code().map(str::to_string),
            admission: session.admission(),
            connection: session.connection(),
            input_enabled: session.input_enabled(),
            block_reason: session.block_reason().map(str::to_string),
            last_announced: session.last_announced(),
            join_pending: session.join_pending(),
            view: app.session().clone(),
            status_notices,
            outbound,
        }
    }

    /// True if the session may send after the step.
    pub fn can_send(&self) -> bool {
        self.admission == Admission::Joined && self.connection == ConnectionState::Connected
    }
}

fn can_send(session: &Session) -> bool {
    session.admission() == Admission::Joined && session.connection() == ConnectionState::Connected
}
