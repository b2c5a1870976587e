//! Clock / Scheduler Tick (C2)
//!
//! A monotonic cadence source the rest of the runtime reads `now()` from.
//! Abstracted behind a trait so tests can advance time deterministically
//! without sleeping — mirroring how the teacher keeps the FSRS scheduler's
//! notion of "now" injectable rather than hard-coded to `Utc::now()`.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The production clock: wall-clock time via `Utc::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock a test can advance explicitly, used to exercise cadence and DND
/// boundary behavior without real sleeps.
#[derive(Debug)]
pub struct TestClock {
    millis_since_epoch: AtomicI64,
}

impl TestClock {
    pub fn at(initial: DateTime<Utc>) -> Self {
        Self {
            millis_since_epoch: AtomicI64::new(initial.timestamp_millis()),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        self.millis_since_epoch
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis_since_epoch
            .store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis_since_epoch.load(Ordering::SeqCst))
            .unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advances_by_requested_delta() {
        let start = Utc::now();
        let clock = TestClock::at(start);
        clock.advance(chrono::Duration::seconds(30));
        assert_eq!((clock.now() - start).num_seconds(), 30);
    }

    #[test]
    fn test_clock_set_overrides_absolute_time() {
        let clock = TestClock::at(Utc::now());
        let target = Utc::now() + chrono::Duration::days(1);
        clock.set(target);
        assert_eq!(clock.now().timestamp_millis(), target.timestamp_millis());
    }
}
