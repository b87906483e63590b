//! Standard session invariants.

use parley_app::SessionView;
use parley_core::Admission;
use parley_proto::ClientEvent;

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// A blocked client sends nothing.
pub struct BlockedIsSilent;

impl Invariant for BlockedIsSilent {
    fn name(&self) -> &'static str {
        "blocked_is_silent"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.prior.admission == Admission::Blocked && !state.outbound.is_empty() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("blocked client sent {:?}", state.outbound),
            });
        }
        Ok(())
    }
}

/// A block disables input and records its reason.
pub struct BlockedDisablesInput;

impl Invariant for BlockedDisablesInput {
    fn name(&self) -> &'static str {
        "blocked_disables_input"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.admission != Admission::Blocked {
            return Ok(());
        }
        if state.input_enabled || state.view.input_enabled {
            return Err(Violation {
                invariant: self.name(),
                message: "input enabled while blocked".to_string(),
            });
        }
        if state.block_reason.is_none() {
            return Err(Violation {
                invariant: self.name(),
                message: "blocked without a reason".to_string(),
            });
        }
        Ok(())
    }
}

/// Input is only enabled while the session can send.
pub struct InputRequiresAdmission;

impl Invariant for InputRequiresAdmission {
    fn name(&self) -> &'static str {
        "input_requires_admission"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.input_enabled && !state.can_send() {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "input enabled in {:?} while {:?}",
                    state.admission, state.connection
                ),
            });
        }
        Ok(())
    }
}

/// The App shows the session as it is.
pub struct ViewMatchesSession;

impl Invariant for ViewMatchesSession {
    fn name(&self) -> &'static str {
        "view_matches_session"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let expected = SessionView {
            admission: state.admission,
            input_enabled: state.input_enabled,
            block_reason: state.block_reason.clone(),
        };
        if state.view != expected {
            return Err(Violation {
                invariant: self.name(),
                message: format!("app shows {:?}, session is {:?}", state.view, expected),
            });
        }
        Ok(())
    }
}

/// The chat log holds at most one status notice per user.
pub struct OneNoticePerUser;

impl Invariant for OneNoticePerUser {
    fn name(&self) -> &'static str {
        "one_notice_per_user"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if let Some((username, count)) = state.status_notices.iter().find(|(_, n)| **n > 1) {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{count} status notices for {username}"),
            });
        }
        Ok(())
    }
}

/// No step issues more than one join request.
pub struct OneJoinPerStep;

impl Invariant for OneJoinPerStep {
    fn name(&self) -> &'static str {
        "one_join_per_step"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let joins =
            state.outbound.iter().filter(|e| matches!(e, ClientEvent::JoinRoom(_))).count();
        if joins > 1 {
            return Err(Violation {
                invariant: self.name(),
                message: format!("{joins} join requests in one step"),
            });
        }
        Ok(())
    }
}

/// Chat and presence only go out while admitted and connected.
///
/// Presence may also go out on the step that admits the client, and an
/// `Offline` on the step that loses the link.
pub struct PresenceRequiresAdmission;

impl Invariant for PresenceRequiresAdmission {
    fn name(&self) -> &'static str {
        "presence_requires_admission"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for event in &state.outbound {
            let allowed = match event {
                ClientEvent::JoinRoom(_) => true,
                ClientEvent::Message(_) | ClientEvent::Image(_) => state.prior.could_send,
                ClientEvent::Status(_) => state.prior.could_send || state.can_send(),
            };
            if !allowed {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{:?} sent without admission", event.kind()),
                });
            }
        }
        Ok(())
    }
}

/// Every outbound event carries the configured identity.
pub struct CredentialsOnEveryEvent;

impl Invariant for CredentialsOnEveryEvent {
    fn name(&self) -> &'static str {
        "credentials_on_every_event"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for event in &state.outbound {
            let username = match event {
                ClientEvent::JoinRoom(e) => &e.username,
                ClientEvent::Message(e) => &e.username,
                ClientEvent::Image(e) => &e.username,
                ClientEvent::Status(e) => &e.username,
            };
            if *username != state.username || event.security_code() != state.access_code.as_deref()
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{:?} carries the wrong identity", event.kind()),
                });
            }
        }
        Ok(())
    }
}
