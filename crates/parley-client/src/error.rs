//! Link error types.

use std::time::Duration;

use thiserror::Error;

use crate::link::LinkState;

/// Errors raised by the link lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// Operation not valid in the current state
    #[error("invalid link transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// State when the operation was attempted
        state: LinkState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Dial did not complete in time
    #[error("handshake timeout after {elapsed:?}")]
    HandshakeTimeout {
        /// How long the dial ran
        elapsed: Duration,
    },

    /// Dial failed
    #[error("connect failed: {0}")]
    Connect(String),

    /// Retry budget used up
    #[error("gave up after {attempts} attempts")]
    Exhausted {
        /// Attempts made
        attempts: u32,
    },
}

impl LinkError {
    /// Returns true if this error is transient and may succeed on retry.
    ///
    /// Dial failures and timeouts are transient. A misuse of the state
    /// machine or an exhausted budget is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::HandshakeTimeout { .. } | Self::Connect(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_failures_are_transient() {
        assert!(LinkError::Connect("refused".into()).is_transient());
        assert!(LinkError::HandshakeTimeout { elapsed: Duration::from_secs(20) }.is_transient());
        assert!(!LinkError::Exhausted { attempts: 5 }.is_transient());
        assert!(
            !LinkError::InvalidState { state: LinkState::Closed, operation: "start" }
                .is_transient()
        );
    }
}
