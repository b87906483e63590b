//! Simulation environment with a virtual clock.
//!
//! Time only moves when the test calls [`SimEnv::advance`] or awaits
//! [`Environment::sleep`], so every run is reproducible.

use std::{
    future::Future,
    ops::{Add, Sub},
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parley_core::Environment;

/// Virtual monotonic instant: time since the simulation started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Simulation start.
    pub const START: Self = Self(Duration::ZERO);

    /// Time since the simulation started.
    pub fn elapsed(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Simulation environment.
///
/// Clones share one clock.
#[derive(Debug, Clone)]
pub struct SimEnv {
    elapsed: Arc<Mutex<Duration>>,
    start: DateTime<Utc>,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Create an environment whose wall clock starts at 2024-01-01 12:00:00
    /// UTC.
    pub fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().unwrap_or_default();
        Self::starting_at(start)
    }

    /// Create an environment with the given wall-clock start.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self { elapsed: Arc::new(Mutex::new(Duration::ZERO)), start }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed = elapsed.saturating_add(by);
    }

    fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.elapsed())
            .ok()
            .and_then(|delta| self.start.checked_add_signed(delta))
            .unwrap_or(self.start)
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        env.advance(Duration::from_secs(5));
        assert_eq!(other.now(), SimInstant::START + Duration::from_secs(5));
    }

    #[test]
    fn wall_clock_follows_virtual_time() {
        let env = SimEnv::new();
        env.advance(Duration::from_secs(61));
        assert_eq!(env.wall_clock().to_rfc3339(), "2024-01-01T12:01:01+00:00");
    }

    #[tokio::test]
    async fn sleep_advances_instantly() {
        let env = SimEnv::new();
        let start = env.now();
        env.sleep(Duration::from_millis(250)).await;
        assert_eq!(env.now() - start, Duration::from_millis(250));
    }

    #[test]
    fn subtraction_saturates() {
        let early = SimInstant::START;
        let late = early + Duration::from_secs(1);
        assert_eq!(early - late, Duration::ZERO);
    }
}
