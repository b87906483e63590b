//! Core state machines for Parley
//!
//! Everything here is sans-IO: methods take inputs (transport callbacks, focus
//! signals, the current instant) and return actions for a driver to execute.
//! No sockets, no timers, no terminal.
//!
//! # Components
//!
//! - [`Session`]: Admission (Unjoined/Joined/Blocked) and presence rules
//! - [`PresenceBroadcaster`]: Focus and liveness signals to presence intents
//! - [`Environment`]: Time source, real or virtual

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
pub mod error;
pub mod presence;
pub mod session;

pub use env::{Environment, Moment};
pub use error::SessionError;
pub use presence::{LivenessTimer, PresenceBroadcaster, PresenceConfig};
pub use session::{Admission, ConnectionState, Credentials, Session, SessionAction};
