//! Error types for the session layer.

use thiserror::Error;

use crate::session::Admission;

/// Longest accepted username, in characters.
pub const MAX_USERNAME_CHARS: usize = 32;

/// Errors raised by the session state machine.
///
/// Validation errors are returned when building [`crate::Credentials`].
/// Send errors are returned when the dispatcher tries to compose an outbound
/// event the session does not currently allow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Username is empty after trimming
    #[error("username must not be empty")]
    EmptyUsername,

    /// Username is longer than [`MAX_USERNAME_CHARS`]
    #[error("username is {len} characters, at most {max} allowed")]
    UsernameTooLong {
        /// Actual length in characters
        len: usize,
        /// Maximum permitted length
        max: usize,
    },

    /// Username contains a control character
    #[error("username contains control character {0:?}")]
    UsernameControlChar(char),

    /// Session was permanently rejected by the server
    #[error("blocked: {reason}")]
    Blocked {
        /// Reason given by the server
        reason: String,
    },

    /// Session has not been admitted to the room
    #[error("not admitted to the room ({admission:?})")]
    NotJoined {
        /// Current admission state
        admission: Admission,
    },

    /// Transport is not connected
    #[error("not connected")]
    Disconnected,
}

impl SessionError {
    /// Returns true if the same operation may succeed later without user
    /// intervention.
    ///
    /// Waiting for admission or reconnection is transient. A block and any
    /// validation failure require a restart with different input.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotJoined { .. } | Self::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waiting_errors_are_transient() {
        assert!(SessionError::Disconnected.is_transient());
        assert!(SessionError::NotJoined { admission: Admission::Unjoined }.is_transient());
    }

    #[test]
    fn block_and_validation_are_not() {
        assert!(!SessionError::Blocked { reason: "bad code".into() }.is_transient());
        assert!(!SessionError::EmptyUsername.is_transient());
        assert!(!SessionError::UsernameControlChar('\u{7}').is_transient());
    }

    #[test]
    fn messages_are_readable() {
        let err = SessionError::UsernameTooLong { len: 40, max: MAX_USERNAME_CHARS };
        assert_eq!(err.to_string(), "username is 40 characters, at most 32 allowed");
    }
}
