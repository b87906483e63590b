//! Presence broadcaster.
//!
//! Turns focus changes and a periodic liveness tick into presence intents.
//! The broadcaster does not deduplicate: every intent goes to
//! [`crate::Session::announce`], which drops anything that would not change
//! the last announced status or is not currently allowed.

use std::time::Duration;

use parley_proto::PresenceStatus;

use crate::env::Moment;

/// Interval between liveness ticks while focused.
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(30);

/// Presence configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceConfig {
    /// Interval of the liveness tick
    pub liveness_interval: Duration,
    /// Whether the client starts out focused
    pub start_focused: bool,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self { liveness_interval: DEFAULT_LIVENESS_INTERVAL, start_focused: true }
    }
}

/// Cancellable repeating timer.
///
/// Sans-IO: the owner asks [`LivenessTimer::poll`] whether the deadline has
/// passed. Firing reschedules one interval after the poll time, so a stalled
/// event loop produces one late tick rather than a burst.
#[derive(Debug, Clone)]
pub struct LivenessTimer<I> {
    interval: Duration,
    next_due: Option<I>,
}

impl<I: Moment> LivenessTimer<I> {
    /// Create a disarmed timer.
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_due: None }
    }

    /// Arm (or re-arm) the timer to fire one interval from `now`.
    pub fn arm(&mut self, now: I) {
        self.next_due = Some(now + self.interval);
    }

    /// Disarm the timer.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// True if the timer will fire.
    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Deadline of the next tick. `None` if disarmed.
    pub fn next_due(&self) -> Option<I> {
        self.next_due
    }

    /// Returns true and reschedules if the deadline has passed.
    pub fn poll(&mut self, now: I) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            },
            _ => false,
        }
    }
}

/// Derives presence intents from focus and liveness.
///
/// Focus maps to `Online`, blur to `Offline`. While focused, a liveness tick
/// re-asserts `Online` every interval so a server that evicted the client for
/// idleness sees it again. Once shut down (teardown or block) the
/// broadcaster produces nothing.
#[derive(Debug, Clone)]
pub struct PresenceBroadcaster<I> {
    focused: bool,
    timer: LivenessTimer<I>,
    shut_down: bool,
}

impl<I: Moment> PresenceBroadcaster<I> {
    /// Create a broadcaster; the timer is armed if starting focused.
    pub fn new(config: &PresenceConfig, now: I) -> Self {
        let mut timer = LivenessTimer::new(config.liveness_interval);
        if config.start_focused {
            timer.arm(now);
        }
        Self { focused: config.start_focused, timer, shut_down: false }
    }

    /// True if the client currently has focus.
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// True once [`PresenceBroadcaster::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Liveness timer (read-only).
    pub fn timer(&self) -> &LivenessTimer<I> {
        &self.timer
    }

    /// Status implied by the current focus.
    pub fn intent(&self) -> PresenceStatus {
        if self.focused { PresenceStatus::Online } else { PresenceStatus::Offline }
    }

    /// Focus gained.
    pub fn on_focus(&mut self, now: I) -> Option<PresenceStatus> {
        if self.shut_down {
            return None;
        }
        self.focused = true;
        self.timer.arm(now);
        Some(PresenceStatus::Online)
    }

    /// Focus lost.
    pub fn on_blur(&mut self) -> Option<PresenceStatus> {
        if self.shut_down {
            return None;
        }
        self.focused = false;
        self.timer.cancel();
        Some(PresenceStatus::Offline)
    }

    /// Periodic poll. Returns an intent when the liveness tick fires.
    pub fn on_tick(&mut self, now: I) -> Option<PresenceStatus> {
        if self.shut_down || !self.timer.poll(now) {
            return None;
        }
        tracing::trace!(focused = self.focused, "liveness tick");
        Some(self.intent())
    }

    /// Stop the timer for good.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.shut_down = true;
    }
}
