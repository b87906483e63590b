//! Session invariants checked after every simulated step.
//!
//! Each invariant is a rule about admission, presence or the chat view that
//! no sequence of transport, server and keyboard events may break.
//!
//! # Architecture
//!
//! After every step the observable state of the session, the App and the
//! frames sent during that step are extracted into a [`SessionSnapshot`],
//! then every registered [`Invariant`] is checked against it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! let snapshot = SessionSnapshot::capture(prior, app, dispatcher, outbound);
//! registry.assert_all(&snapshot, "after reconnect");
//! ```

mod checks;
mod snapshot;

pub use checks::{
    BlockedDisablesInput, BlockedIsSilent, CredentialsOnEveryEvent, InputRequiresAdmission,
    OneJoinPerStep, OneNoticePerUser, PresenceRequiresAdmission, ViewMatchesSession,
};
pub use snapshot::{PriorState, SessionSnapshot};

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// An invariant that can be checked against session state.
///
/// Invariants capture WHAT must be true, not specific test scenarios.
pub trait Invariant: Send + Sync {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Check the invariant against the state after a step.
    ///
    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Registry of invariants to check.
///
/// Use [`InvariantRegistry::standard()`] for the session rules.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl Default for InvariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { invariants: Vec::new() }
    }

    /// Create a registry with the standard session invariants.
    ///
    /// Includes:
    /// - [`BlockedIsSilent`]: nothing is sent once blocked
    /// - [`BlockedDisablesInput`]: a block disables input and keeps a reason
    /// - [`InputRequiresAdmission`]: input is enabled only while joined
    /// - [`ViewMatchesSession`]: the App shows the session as it is
    /// - [`OneNoticePerUser`]: status notices collapse per user
    /// - [`OneJoinPerStep`]: join requests are not duplicated
    /// - [`PresenceRequiresAdmission`]: chat and presence need admission
    /// - [`CredentialsOnEveryEvent`]: every event carries the identity
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(BlockedIsSilent);
        registry.add(BlockedDisablesInput);
        registry.add(InputRequiresAdmission);
        registry.add(ViewMatchesSession);
        registry.add(OneNoticePerUser);
        registry.add(OneJoinPerStep);
        registry.add(PresenceRequiresAdmission);
        registry.add(CredentialsOnEveryEvent);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against the given state.
    ///
    /// Returns `Ok(())` if all invariants hold, or all violations found.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.invariants.iter().filter_map(|inv| inv.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking on the first failed check.
    ///
    /// Use this in tests where you want immediate failure with context.
    #[allow(clippy::panic, reason = "test helper: a violation fails the test")]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_invariants() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn empty_registry_accepts_anything() {
        assert!(InvariantRegistry::new().is_empty());
    }
}
