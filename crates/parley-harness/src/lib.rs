//! Deterministic simulation harness for the Parley client.
//!
//! Simulation implementations of [`parley_core::Environment`] and
//! [`parley_app::Driver`] so the production [`parley_app::Runtime`] runs
//! against a virtual clock and in-memory queues.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks behavioral properties of the session after
//! every simulated step. Invariants state WHAT must be true across all
//! execution paths, not specific scenarios. Use
//! [`InvariantRegistry::standard()`] for the session rules.
//!
//! # Scenarios
//!
//! [`Scenario`] wraps a runtime, feeds it events one at a time, collects what
//! went out on the wire and checks invariants after each step.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    BlockedDisablesInput, BlockedIsSilent, CredentialsOnEveryEvent, InputRequiresAdmission,
    Invariant, InvariantRegistry, InvariantResult, OneJoinPerStep, OneNoticePerUser,
    PresenceRequiresAdmission, PriorState, SessionSnapshot, ViewMatchesSession, Violation,
};
pub use scenario::Scenario;
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
