#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::Result;
use crate::error::Error;

const DEFAULT_HEARTBEAT_INTERVAL_DURATION: Duration = Duration::from_secs(5);
const DEFAULT_RECONNECT_DELAY_DURATION: Duration = Duration::from_secs(5);
const DEFAULT_INITIAL_BACKOFF_DURATION: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF_DURATION: Duration = Duration::from_secs(60);
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Configuration for WebSocket client behavior.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval for sending PING messages to keep connection alive
    pub heartbeat_interval: Duration,
    /// Maximum time to wait for PONG response before considering connection dead.
    /// `None` means twice the heartbeat interval.
    pub heartbeat_timeout: Option<Duration>,
    /// Whether a closed connection is re-established automatically
    pub auto_reconnect: bool,
    /// Reconnection strategy configuration
    pub reconnect: ReconnectConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL_DURATION,
            heartbeat_timeout: None,
            auto_reconnect: true,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl Config {
    /// Time allowed between a PING and its PONG.
    #[must_use]
    pub fn pong_timeout(&self) -> Duration {
        self.heartbeat_timeout
            .unwrap_or_else(|| self.heartbeat_interval.saturating_mul(2))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(Error::config("heartbeat interval must be non-zero"));
        }
        if self.pong_timeout().is_zero() {
            return Err(Error::config("heartbeat timeout must be non-zero"));
        }
        if let ReconnectStrategy::Exponential {
            initial, max, ..
        } = &self.reconnect.strategy
            && initial > max
        {
            return Err(Error::config(
                "initial reconnect backoff must not exceed the maximum backoff",
            ));
        }
        Ok(())
    }
}

/// Configuration for automatic reconnection behavior.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct ReconnectConfig {
    /// Maximum number of consecutive reconnection attempts before giving up.
    /// `None` means infinite retries.
    pub max_attempts: Option<u32>,
    /// Delay between a close and the next connection attempt
    pub strategy: ReconnectStrategy,
}

/// How long to wait before each reconnection attempt.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum ReconnectStrategy {
    /// The same delay before every attempt
    Fixed(Duration),
    /// Capped exponential backoff with jitter
    Exponential {
        /// Initial backoff duration for first reconnection attempt
        initial: Duration,
        /// Maximum backoff duration
        max: Duration,
        /// Multiplier for exponential backoff
        multiplier: f64,
    },
}

impl Default for ReconnectStrategy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_RECONNECT_DELAY_DURATION)
    }
}

impl ReconnectStrategy {
    /// Capped exponential backoff starting at one second and capped at one minute.
    #[must_use]
    pub fn exponential() -> Self {
        Self::Exponential {
            initial: DEFAULT_INITIAL_BACKOFF_DURATION,
            max: DEFAULT_MAX_BACKOFF_DURATION,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl From<&ReconnectStrategy> for Box<dyn Backoff + Send> {
    fn from(strategy: &ReconnectStrategy) -> Self {
        match strategy {
            ReconnectStrategy::Fixed(delay) => Box::new(Constant::new(*delay)),
            ReconnectStrategy::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let backoff: ExponentialBackoff = ExponentialBackoffBuilder::default()
                    .with_initial_interval(*initial)
                    .with_max_interval(*max)
                    .with_multiplier(*multiplier)
                    .with_max_elapsed_time(None) // We handle max attempts separately
                    .build();
                Box::new(backoff)
            }
        }
    }
}
