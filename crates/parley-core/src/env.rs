//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system time. Production uses the OS clocks,
//! simulation uses a virtual clock that only moves when the test advances it.

use std::{
    future::Future,
    ops::{Add, Sub},
    time::Duration,
};

use chrono::{DateTime, Utc};

/// Monotonic instant usable by the state machines.
///
/// Implemented for anything that behaves like [`std::time::Instant`]: ordered,
/// copyable, and closed under adding a [`Duration`].
pub trait Moment:
    Copy + Ord + Send + Sync + Add<Duration, Output = Self> + Sub<Output = Duration>
{
}

impl<T> Moment for T where
    T: Copy + Ord + Send + Sync + Add<Duration, Output = T> + Sub<Output = Duration>
{
}

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards
/// - `wall_clock()` is only used for display and message timestamps, never
///   for scheduling
pub trait Environment: Clone + Send + Sync + 'static {
    /// Instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`, simulation a virtual instant.
    type Instant: Moment;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Current calendar time in UTC.
    fn wall_clock(&self) -> DateTime<Utc>;

    /// Sleeps for the specified duration.
    ///
    /// Only used by driver code, never by the state machines.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
