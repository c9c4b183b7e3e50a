//! Trailing-edge debounce timer.
//!
//! Coalesces bursts of text-change events into a single deferred filtering
//! pass. The timer holds an explicit deadline and is driven by the host event
//! loop: the host asks [`time_until_fire`](Debouncer::time_until_fire) how
//! long to sleep and calls [`poll`](Debouncer::poll) when it wakes. All
//! instants are passed in by the caller; the timer never reads the clock
//! itself, which keeps scheduling deterministic under test.

use std::time::{Duration, Instant};

/// The default quiet period before filtering runs.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// A single-shot, resettable countdown.
///
/// Rescheduling while a countdown is pending restarts it rather than
/// stacking a second one ("most recent schedule wins"); there is no
/// leading-edge fire.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Creates a debouncer with the default 500 ms quiet period.
    pub fn new() -> Self {
        Self::with_delay(DEFAULT_DELAY)
    }

    /// Creates a debouncer with a custom quiet period.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Returns the configured quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Changes the quiet period for subsequent schedules.
    ///
    /// A deadline already pending keeps its original fire time.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// (Re)arms the countdown to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
        tracing::trace!(target: "typeahead::debounce", delay = ?self.delay, "debounce scheduled");
    }

    /// Disarms any pending countdown without firing.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            tracing::trace!(target: "typeahead::debounce", "debounce cancelled");
        }
    }

    /// Returns `true` if a countdown is pending.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns how long until the pending countdown fires, if any.
    ///
    /// Returns `Duration::ZERO` when the deadline has already passed.
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|deadline| {
            if deadline > now {
                deadline - now
            } else {
                Duration::ZERO
            }
        })
    }

    /// Fires the countdown if its deadline has passed.
    ///
    /// Returns `true` at most once per schedule; the deadline is consumed on
    /// fire.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                tracing::trace!(target: "typeahead::debounce", "debounce fired");
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}
