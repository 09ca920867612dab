//! # Clock Sources
//!
//! The ledger never reads the wall clock itself: every time-gated
//! operation takes `now` as an argument. The substrate that sequences
//! transactions is the authority on time and exposes it through [`Clock`].
//!
//! Two implementations ship here: [`SystemClock`] for live use and
//! [`ManualClock`] for tests and scenario replay.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::temporal::Timestamp;

/// A source of the current time. Readings must be non-decreasing.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Reads UTC wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
///
/// `set` and `advance` never move the clock backwards, so the
/// non-decreasing contract of [`Clock`] holds for any call sequence.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Create a clock reading `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: AtomicU64::new(start.as_millis()),
        }
    }

    /// Move the clock to `to`, or leave it if `to` is in the past.
    /// Returns the reading after the call.
    pub fn set(&self, to: Timestamp) -> Timestamp {
        let prev = self.millis.fetch_max(to.as_millis(), Ordering::SeqCst);
        Timestamp::from_millis(prev.max(to.as_millis()))
    }

    /// Move the clock forward by `millis`, saturating at the maximum.
    /// Returns the reading after the call.
    pub fn advance(&self, millis: u64) -> Timestamp {
        let mut current = self.millis.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(millis);
            match self.millis.compare_exchange_weak(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Timestamp::from_millis(next),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(Timestamp::from_millis(100));
        assert_eq!(clock.advance(50), Timestamp::from_millis(150));
        assert_eq!(clock.now(), Timestamp::from_millis(150));
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new(Timestamp::from_millis(1_000));
        assert_eq!(
            clock.set(Timestamp::from_millis(10)),
            Timestamp::from_millis(1_000)
        );
        assert_eq!(
            clock.set(Timestamp::from_millis(2_000)),
            Timestamp::from_millis(2_000)
        );
        assert_eq!(clock.now(), Timestamp::from_millis(2_000));
    }

    #[test]
    fn manual_clock_saturates() {
        let clock = ManualClock::new(Timestamp::from_millis(u64::MAX - 1));
        assert_eq!(clock.advance(10), Timestamp::from_millis(u64::MAX));
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
