//! Production Environment implementation using system time.
//!
//! `SystemEnv` reads the OS clocks and sleeps on the tokio timer, so time
//! advances naturally and runs are not reproducible.

use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use parley_core::Environment;

/// Production environment using system time.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods, reason = "production clock")]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    #[allow(clippy::disallowed_methods, reason = "production clock")]
    fn wall_clock(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
