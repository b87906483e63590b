//! Transport adapter for Parley
//!
//! Owns the connect, disconnect and reconnect lifecycle of the link to the
//! room server. The lifecycle itself is a sans-IO state machine ([`Link`])
//! driven by the same action pattern as [`parley_core`]; the QUIC I/O that
//! executes its actions is optional.
//!
//! # Components
//!
//! - [`RetryPolicy`]: Bounded attempts, linear or exponential backoff, cap,
//!   handshake timeout
//! - [`Link`]: Lifecycle state machine producing [`LinkAction`]s
//! - [`TransportEvent`]: Lifecycle notifications for the session
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::connect`]: Dial a server over QUIC
//! - [`transport::spawn_link`]: Supervisor task running a [`Link`] against
//!   real connections

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod event;
mod link;
mod retry;

#[cfg(feature = "transport")]
pub mod transport;

pub use error::LinkError;
pub use event::{LinkAction, TransportEvent};
pub use link::{Link, LinkState};
pub use retry::{Backoff, RetryPolicy};
