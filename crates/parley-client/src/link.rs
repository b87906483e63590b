//! Link lifecycle state machine.
//!
//! Decides when to dial, when to wait and when to give up. Uses the action
//! pattern: methods take the current instant and return [`LinkAction`]s; the
//! driver performs the dial and reports the outcome back.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ start  ┌─────────┐ dial_succeeded ┌───────────┐
//! │ Idle │───────>│ Dialing │───────────────>│ Connected │
//! └──────┘        └─────────┘                └───────────┘
//!                   │     ↑                        │
//!     dial_failed / │     │ tick (delay elapsed)   │ connection_lost
//!     timeout       ↓     │                        │
//!                 ┌─────────┐ <────────────────────┘
//!                 │ Backoff │
//!                 └─────────┘
//!                      │ budget used up
//!                      ↓
//!                ┌───────────┐        close() from any ┌────────┐
//!                │ Exhausted │        live state:      │ Closed │
//!                └───────────┘                         └────────┘
//! ```

use std::time::Duration;

use parley_core::Moment;

use crate::{LinkAction, LinkError, RetryPolicy, TransportEvent};

/// Link lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Not started
    Idle,
    /// Dial in flight
    Dialing,
    /// Live connection
    Connected,
    /// Waiting before the next dial
    Backoff,
    /// Closed on request; never reconnects
    Closed,
    /// Retry budget used up; never reconnects
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
enum Phase<I> {
    Idle,
    Dialing { started: I },
    Connected,
    Backoff { until: I },
    Closed,
    Exhausted,
}

/// Link lifecycle state machine.
///
/// Pure state machine: no sockets, no timers. Generic over the instant type
/// so simulation can drive it with virtual time.
///
/// # Invariants
///
/// - `Connected` is reported once per link; later recoveries are
///   `Reconnected`.
/// - At most `max_attempts` retries follow any single failure streak.
/// - `Closed` and `Exhausted` are terminal.
#[derive(Debug, Clone)]
pub struct Link<I> {
    policy: RetryPolicy,
    phase: Phase<I>,
    /// Retry number of the current failure streak (0 = first dial).
    attempt: u32,
    ever_connected: bool,
    last_error: Option<LinkError>,
}

impl<I: Moment> Link<I> {
    /// Create an idle link.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, phase: Phase::Idle, attempt: 0, ever_connected: false, last_error: None }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        match self.phase {
            Phase::Idle => LinkState::Idle,
            Phase::Dialing { .. } => LinkState::Dialing,
            Phase::Connected => LinkState::Connected,
            Phase::Backoff { .. } => LinkState::Backoff,
            Phase::Closed => LinkState::Closed,
            Phase::Exhausted => LinkState::Exhausted,
        }
    }

    /// Retry policy in use.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Retry number of the current failure streak. 0 when healthy.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Most recent failure. `None` if the last dial succeeded.
    #[must_use]
    pub fn last_error(&self) -> Option<&LinkError> {
        self.last_error.as_ref()
    }

    /// When the next dial is due. `None` unless backing off.
    #[must_use]
    pub fn next_dial(&self) -> Option<I> {
        match self.phase {
            Phase::Backoff { until } => Some(until),
            _ => None,
        }
    }

    /// Begin the first dial.
    ///
    /// # Errors
    ///
    /// - `LinkError::InvalidState` if not `Idle`
    pub fn start(&mut self, now: I) -> Result<Vec<LinkAction>, LinkError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(LinkError::InvalidState { state: self.state(), operation: "start" });
        }

        self.phase = Phase::Dialing { started: now };
        Ok(vec![LinkAction::Dial { attempt: 0 }])
    }

    /// The dial in flight completed.
    ///
    /// # Errors
    ///
    /// - `LinkError::InvalidState` if not `Dialing`
    pub fn dial_succeeded(&mut self) -> Result<Vec<LinkAction>, LinkError> {
        if !matches!(self.phase, Phase::Dialing { .. }) {
            return Err(LinkError::InvalidState {
                state: self.state(),
                operation: "dial_succeeded",
            });
        }

        let event = if self.ever_connected {
            TransportEvent::Reconnected { attempts: self.attempt }
        } else {
            TransportEvent::Connected
        };

        tracing::info!(attempt = self.attempt, "link up");
        self.phase = Phase::Connected;
        self.ever_connected = true;
        self.attempt = 0;
        self.last_error = None;

        Ok(vec![LinkAction::Notify(event)])
    }

    /// The dial in flight failed.
    ///
    /// # Errors
    ///
    /// - `LinkError::InvalidState` if not `Dialing`
    pub fn dial_failed(&mut self, now: I, error: LinkError) -> Result<Vec<LinkAction>, LinkError> {
        if !matches!(self.phase, Phase::Dialing { .. }) {
            return Err(LinkError::InvalidState { state: self.state(), operation: "dial_failed" });
        }

        tracing::warn!(attempt = self.attempt, %error, "dial failed");
        let event = match &error {
            LinkError::HandshakeTimeout { .. } => TransportEvent::ConnectTimeout,
            other => TransportEvent::ConnectError { message: other.to_string() },
        };
        self.last_error = Some(error);

        let mut actions = vec![LinkAction::Notify(event)];
        actions.extend(self.schedule_retry(now));
        Ok(actions)
    }

    /// The live connection dropped.
    ///
    /// # Errors
    ///
    /// - `LinkError::InvalidState` if not `Connected`
    pub fn connection_lost(
        &mut self,
        now: I,
        reason: impl Into<String>,
    ) -> Result<Vec<LinkAction>, LinkError> {
        if !matches!(self.phase, Phase::Connected) {
            return Err(LinkError::InvalidState {
                state: self.state(),
                operation: "connection_lost",
            });
        }

        let reason = reason.into();
        tracing::warn!(%reason, "link down");

        let mut actions = vec![LinkAction::Notify(TransportEvent::Disconnected { reason })];
        actions.extend(self.schedule_retry(now));
        Ok(actions)
    }

    /// Periodic poll: enforces the handshake timeout and ends backoff.
    pub fn tick(&mut self, now: I) -> Vec<LinkAction> {
        match self.phase {
            Phase::Dialing { started } => {
                let elapsed = now - started;
                if elapsed < self.policy.handshake_timeout {
                    return vec![];
                }
                let mut actions = vec![LinkAction::Hangup];
                // Phase is Dialing, so this cannot fail.
                actions.extend(
                    self.dial_failed(now, LinkError::HandshakeTimeout { elapsed })
                        .unwrap_or_default(),
                );
                actions
            },
            Phase::Backoff { until } if now >= until => {
                self.phase = Phase::Dialing { started: now };
                vec![LinkAction::Dial { attempt: self.attempt }]
            },
            Phase::Idle
            | Phase::Backoff { .. }
            | Phase::Connected
            | Phase::Closed
            | Phase::Exhausted => vec![],
        }
    }

    /// Close for good. Idempotent; an exhausted link stays exhausted.
    pub fn close(&mut self) -> Vec<LinkAction> {
        if matches!(self.phase, Phase::Exhausted) {
            return vec![];
        }
        let actions = match self.phase {
            Phase::Connected | Phase::Dialing { .. } => vec![LinkAction::Hangup],
            Phase::Idle | Phase::Backoff { .. } | Phase::Closed | Phase::Exhausted => vec![],
        };
        if !matches!(self.phase, Phase::Closed) {
            tracing::info!("link closed");
        }
        self.phase = Phase::Closed;
        actions
    }

    fn schedule_retry(&mut self, now: I) -> Vec<LinkAction> {
        self.attempt = self.attempt.saturating_add(1);

        if !self.policy.allows(self.attempt) {
            let attempts = self.attempt.saturating_sub(1);
            tracing::warn!(attempts, "retry budget exhausted");
            self.phase = Phase::Exhausted;
            self.last_error = Some(LinkError::Exhausted { attempts });
            return vec![LinkAction::Notify(TransportEvent::ReconnectFailed)];
        }

        let delay: Duration = self.policy.delay_for(self.attempt);
        tracing::debug!(attempt = self.attempt, ?delay, "scheduling retry");
        self.phase = Phase::Backoff { until: now + delay };
        vec![LinkAction::Notify(TransportEvent::Reconnecting { attempt: self.attempt })]
    }
}
