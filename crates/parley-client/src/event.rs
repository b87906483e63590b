//! Link actions and lifecycle notifications.

/// Lifecycle notifications delivered to the session, in connection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// First successful connection
    Connected,

    /// Live connection dropped
    Disconnected {
        /// Why the connection ended
        reason: String,
    },

    /// Connection restored after a drop or failed dial
    Reconnected {
        /// Attempts it took
        attempts: u32,
    },

    /// Retrying; `attempt` is 1-based
    Reconnecting {
        /// Attempt about to be made
        attempt: u32,
    },

    /// A dial failed
    ConnectError {
        /// Failure description
        message: String,
    },

    /// A dial did not complete within the handshake timeout
    ConnectTimeout,

    /// Retry budget used up; the link stays down
    ReconnectFailed,
}

/// Actions returned by the link state machine.
///
/// The driver executes them in order:
/// - `Dial`: start connecting to the server
/// - `Hangup`: close the live connection or abandon the dial in flight
/// - `Notify`: pass the event on to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Start a dial
    Dial {
        /// 0 for the first dial, otherwise the retry number
        attempt: u32,
    },

    /// Close the connection
    Hangup,

    /// Deliver a lifecycle notification
    Notify(TransportEvent),
}
