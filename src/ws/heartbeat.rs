//! Liveness monitor: periodic PING with a single pending PONG deadline.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep, interval_at, sleep};

/// Outcome of waiting on the monitor's timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeartbeatEvent {
    /// Time to send the next PING
    Tick,
    /// The pending PONG did not arrive in time
    Timeout,
}

/// Owns the ping interval and the pong deadline for the current connection.
///
/// Both timers are singular: starting a running monitor or arming an armed
/// deadline does nothing. While stopped, [`Heartbeat::next`] never resolves.
pub(crate) struct Heartbeat {
    period: Duration,
    timeout: Duration,
    ticker: Option<Interval>,
    pong_deadline: Option<Pin<Box<Sleep>>>,
}

impl Heartbeat {
    pub(crate) fn new(period: Duration, timeout: Duration) -> Self {
        Self {
            period,
            timeout,
            ticker: None,
            pong_deadline: None,
        }
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    #[cfg(test)]
    pub(crate) fn awaiting_pong(&self) -> bool {
        self.pong_deadline.is_some()
    }

    /// Start ticking. The first tick fires one period from now.
    pub(crate) fn start(&mut self) {
        if self.ticker.is_some() {
            return;
        }
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    /// Cancel the interval and any pending PONG deadline.
    pub(crate) fn stop(&mut self) {
        self.ticker = None;
        self.pong_deadline = None;
    }

    /// Arm the PONG deadline after a PING went out. Returns `false` if one is already pending.
    pub(crate) fn arm_pong_timeout(&mut self) -> bool {
        if self.pong_deadline.is_some() {
            return false;
        }
        self.pong_deadline = Some(Box::pin(sleep(self.timeout)));
        true
    }

    /// Cancel the pending PONG deadline. Returns `false` for an unsolicited PONG.
    pub(crate) fn pong_received(&mut self) -> bool {
        self.pong_deadline.take().is_some()
    }

    /// Wait for the next tick or deadline expiry. Cancel safe.
    pub(crate) async fn next(&mut self) -> HeartbeatEvent {
        let event = {
            let Self {
                ticker,
                pong_deadline,
                ..
            } = self;

            tokio::select! {
                biased;

                () = wait_deadline(pong_deadline) => HeartbeatEvent::Timeout,
                () = wait_tick(ticker) => HeartbeatEvent::Tick,
            }
        };

        if event == HeartbeatEvent::Timeout {
            self.pong_deadline = None;
        }
        event
    }
}

async fn wait_deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

async fn wait_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}
