//! Non-blocking reconnect pacing for the transport layer.
//!
//! The control loop must never stall while the transport is down - lamp
//! output and input handling stay live. Instead of sleeping between
//! connection attempts, the embedding polls a [`Reconnector`] from the same
//! cooperative tick as the pattern player: attempt, wait with a timer, retry
//! with doubling backoff.
//!
//! ```text
//! connected ──lost──▶ waiting ──delay elapsed──▶ attempt due
//!     ▲                  ▲                            │
//!     └──── success ─────┴───────── failure ──────────┘
//! ```

use crate::time::TimeInstant;

/// Backoff bounds for reconnect attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry, in milliseconds.
    pub initial_ms: u32,

    /// Upper bound the doubling backoff saturates at.
    pub max_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_ms: 500,
            max_ms: 30_000,
        }
    }
}

/// Schedules bounded reconnect attempts without blocking the control loop.
pub struct Reconnector<I: TimeInstant> {
    policy: RetryPolicy,
    delay_ms: u32,
    waiting_since: Option<I>,
}

impl<I: TimeInstant> Reconnector<I> {
    /// Creates an idle reconnector.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            delay_ms: policy.initial_ms,
            waiting_since: None,
        }
    }

    /// Records a lost connection; the first retry is due after the initial
    /// delay.
    pub fn disconnected(&mut self, now: I) {
        self.delay_ms = self.policy.initial_ms;
        self.waiting_since = Some(now);
    }

    /// Records a failed attempt; the next retry waits twice as long, up to
    /// the policy's bound.
    pub fn attempt_failed(&mut self, now: I) {
        self.delay_ms = self.delay_ms.saturating_mul(2).min(self.policy.max_ms);
        self.waiting_since = Some(now);
    }

    /// Records an established connection; no further attempts are due.
    pub fn connected(&mut self) {
        self.delay_ms = self.policy.initial_ms;
        self.waiting_since = None;
    }

    /// Returns true when a reconnect attempt is due.
    ///
    /// Call once per control-loop tick; when it fires, make one attempt and
    /// report the outcome via [`connected`] or [`attempt_failed`].
    ///
    /// [`connected`]: Reconnector::connected
    /// [`attempt_failed`]: Reconnector::attempt_failed
    pub fn poll(&mut self, now: I) -> bool {
        match self.waiting_since {
            Some(since) if now.millis_since(since) > self.delay_ms => {
                self.waiting_since = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Millis;

    #[test]
    fn idle_reconnector_is_never_due() {
        let mut reconnector: Reconnector<Millis> = Reconnector::new(RetryPolicy::default());
        assert!(!reconnector.poll(Millis(1_000_000)));
    }

    #[test]
    fn first_retry_waits_the_initial_delay() {
        let mut reconnector = Reconnector::new(RetryPolicy::default());
        reconnector.disconnected(Millis(0));

        assert!(!reconnector.poll(Millis(500)));
        assert!(reconnector.poll(Millis(501)));
        // Due fired once; the caller owns the attempt now.
        assert!(!reconnector.poll(Millis(502)));
    }

    #[test]
    fn failed_attempts_double_the_delay_up_to_the_bound() {
        let policy = RetryPolicy {
            initial_ms: 500,
            max_ms: 1500,
        };
        let mut reconnector = Reconnector::new(policy);
        reconnector.disconnected(Millis(0));
        assert!(reconnector.poll(Millis(501)));

        reconnector.attempt_failed(Millis(501));
        assert!(!reconnector.poll(Millis(1501)));
        assert!(reconnector.poll(Millis(1502)));

        // 2000 would exceed the bound; saturates at 1500.
        reconnector.attempt_failed(Millis(1502));
        assert!(!reconnector.poll(Millis(3002)));
        assert!(reconnector.poll(Millis(3003)));
    }

    #[test]
    fn successful_connection_resets_the_backoff() {
        let mut reconnector = Reconnector::new(RetryPolicy::default());
        reconnector.disconnected(Millis(0));
        assert!(reconnector.poll(Millis(501)));
        reconnector.attempt_failed(Millis(501));
        reconnector.connected();

        assert!(!reconnector.poll(Millis(1_000_000)));

        reconnector.disconnected(Millis(1_000_000));
        assert!(reconnector.poll(Millis(1_000_501)));
    }
}
