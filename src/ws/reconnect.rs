//! Single-flight reconnect scheduler.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use backoff::backoff::Backoff;
use tokio::time::{Sleep, sleep};

use super::config::ReconnectConfig;

/// Result of asking the scheduler to arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Schedule {
    /// A reconnect will fire after the given delay
    Scheduled(Duration),
    /// A reconnect was already pending, nothing changed
    AlreadyPending,
    /// The attempt budget is spent
    Exhausted,
}

pub(crate) struct Reconnect {
    backoff: Box<dyn Backoff + Send>,
    max_attempts: Option<u32>,
    attempts: u32,
    pending: Option<Pin<Box<Sleep>>>,
}

impl Reconnect {
    pub(crate) fn new(config: &ReconnectConfig) -> Self {
        Self {
            backoff: (&config.strategy).into(),
            max_attempts: config.max_attempts,
            attempts: 0,
            pending: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn schedule(&mut self) -> Schedule {
        if self.pending.is_some() {
            return Schedule::AlreadyPending;
        }
        if self.max_attempts.is_some_and(|max| self.attempts >= max) {
            return Schedule::Exhausted;
        }
        let Some(delay) = self.backoff.next_backoff() else {
            return Schedule::Exhausted;
        };

        self.attempts = self.attempts.saturating_add(1);
        self.pending = Some(Box::pin(sleep(delay)));
        Schedule::Scheduled(delay)
    }

    /// Drop the pending reconnect, if any. Returns `true` if one was pending.
    pub(crate) fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Forget previous failures after a successful open.
    pub(crate) fn reset(&mut self) {
        self.attempts = 0;
        self.backoff.reset();
    }

    /// Resolve when the pending reconnect is due, clearing it. Never resolves when idle.
    pub(crate) async fn fired(&mut self) {
        match self.pending.as_mut() {
            Some(timer) => timer.as_mut().await,
            None => pending().await,
        }
        self.pending = None;
    }
}
