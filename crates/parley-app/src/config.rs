//! Client configuration.

use std::time::Duration;

use parley_client::RetryPolicy;
use parley_core::{Credentials, PresenceConfig, SessionError};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Username rejected locally.
    #[error("invalid username: {0}")]
    Username(#[from] SessionError),

    /// No server address given.
    #[error("server address is empty")]
    EmptyServerAddr,

    /// A duration that must be positive is zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Offending setting
        field: &'static str,
    },

    /// Retry cap below the base delay.
    #[error("retry max delay {max:?} is below the base delay {base:?}")]
    DelayCapBelowBase {
        /// Configured base delay
        base: Duration,
        /// Configured cap
        max: Duration,
    },
}

/// Validated client configuration.
///
/// Defaults: 5 retries, 1 s base delay, 5 s cap, 20 s handshake timeout,
/// exponential backoff; liveness every 30 s; focused at start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    server_addr: String,
    credentials: Credentials,
    /// Presence broadcaster settings
    pub presence: PresenceConfig,
    /// Link retry policy
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Build a configuration with default presence and retry settings.
    ///
    /// The username is trimmed; an empty or whitespace access code becomes
    /// `None` (open room).
    ///
    /// # Errors
    ///
    /// - `ConfigError::EmptyServerAddr` if `server_addr` is blank
    /// - `ConfigError::Username` if the username is empty, longer than 32
    ///   characters or contains control characters
    pub fn new(
        server_addr: impl Into<String>,
        username: impl AsRef<str>,
        access_code: Option<String>,
    ) -> Result<Self, ConfigError> {
        let server_addr = server_addr.into().trim().to_string();
        if server_addr.is_empty() {
            return Err(ConfigError::EmptyServerAddr);
        }

        let credentials = Credentials::new(username, access_code)?;

        Ok(Self {
            server_addr,
            credentials,
            presence: PresenceConfig::default(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the presence settings.
    #[must_use]
    pub fn with_presence(mut self, presence: PresenceConfig) -> Self {
        self.presence = presence;
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check the timing settings.
    ///
    /// # Errors
    ///
    /// - `ConfigError::ZeroDuration` for a zero liveness interval, base delay
    ///   or handshake timeout
    /// - `ConfigError::DelayCapBelowBase` if `max_delay < base_delay`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("liveness interval", self.presence.liveness_interval),
            ("retry delay", self.retry.base_delay),
            ("connect timeout", self.retry.handshake_timeout),
        ];
        if let Some((field, _)) = positive.into_iter().find(|(_, d)| d.is_zero()) {
            return Err(ConfigError::ZeroDuration { field });
        }

        if self.retry.max_delay < self.retry.base_delay {
            return Err(ConfigError::DelayCapBelowBase {
                base: self.retry.base_delay,
                max: self.retry.max_delay,
            });
        }

        Ok(())
    }

    /// Server address (host:port).
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Validated credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Display name.
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    /// Shared room access code. `None` for an open room.
    pub fn access_code(&self) -> Option<&str> {
        self.credentials.access_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("127.0.0.1:4433", "alice", None).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay, Duration::from_secs(1));
        assert_eq!(config.retry.max_delay, Duration::from_secs(5));
        assert_eq!(config.retry.handshake_timeout, Duration::from_secs(20));
        assert_eq!(config.presence.liveness_interval, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn access_code_normalized() {
        let config = ClientConfig::new("h:1", " alice ", Some("  ".into())).unwrap();
        assert_eq!(config.username(), "alice");
        assert_eq!(config.access_code(), None);

        let config = ClientConfig::new("h:1", "alice", Some("s3cret".into())).unwrap();
        assert_eq!(config.access_code(), Some("s3cret"));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(ClientConfig::new(" ", "alice", None), Err(ConfigError::EmptyServerAddr));
        assert_eq!(
            ClientConfig::new("h:1", "  ", None),
            Err(ConfigError::Username(SessionError::EmptyUsername))
        );
        assert!(matches!(
            ClientConfig::new("h:1", "a".repeat(33), None),
            Err(ConfigError::Username(SessionError::UsernameTooLong { .. }))
        ));
    }

    #[test]
    fn validate_timings() {
        let mut config = ClientConfig::new("h:1", "alice", None).unwrap();
        config.presence.liveness_interval = Duration::ZERO;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration { field: "liveness interval" })
        );

        let mut config = ClientConfig::new("h:1", "alice", None).unwrap();
        config.retry.max_delay = Duration::from_millis(10);
        assert!(matches!(config.validate(), Err(ConfigError::DelayCapBelowBase { .. })));
    }
}
