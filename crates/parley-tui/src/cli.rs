//! Command-line arguments.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use parley_app::{ClientConfig, ConfigError};
use parley_client::{Backoff, RetryPolicy};
use parley_core::PresenceConfig;

/// Parley terminal chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Terminal client for Parley chat rooms")]
#[command(version)]
pub struct Args {
    /// Room server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:4433")]
    pub server: String,

    /// Name shown to the room
    #[arg(short, long)]
    pub username: String,

    /// Access code for a gated room
    #[arg(short = 'c', long, env = "PARLEY_ACCESS_CODE", hide_env_values = true)]
    pub access_code: Option<String>,

    /// Reconnection attempts after the link drops
    #[arg(long, default_value_t = 5)]
    pub retry_attempts: u32,

    /// Delay before the first reconnection attempt
    #[arg(long, default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Upper bound on any reconnection delay
    #[arg(long, default_value_t = 5000)]
    pub retry_max_delay_ms: u64,

    /// Time allowed for one connection attempt
    #[arg(long, default_value_t = 20_000)]
    pub connect_timeout_ms: u64,

    /// Interval of the presence liveness tick
    #[arg(long, default_value_t = 30)]
    pub liveness_secs: u64,

    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file; logging is off without it
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// Build and validate the client configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let retry = RetryPolicy {
            max_attempts: self.retry_attempts,
            base_delay: Duration::from_millis(self.retry_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            handshake_timeout: Duration::from_millis(self.connect_timeout_ms),
            backoff: Backoff::Exponential,
        };
        let presence = PresenceConfig {
            liveness_interval: Duration::from_secs(self.liveness_secs),
            start_focused: true,
        };

        let config =
            ClientConfig::new(self.server.as_str(), &self.username, self.access_code.clone())?
                .with_retry(retry)
                .with_presence(presence);
        config.validate()?;
        Ok(config)
    }
}
