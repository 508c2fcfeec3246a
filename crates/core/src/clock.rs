//! Wall-clock abstraction.
//!
//! Cache entries are stamped with wall-clock time so that durable entries stay
//! meaningful across restarts. The clock is injected so TTL boundaries can be
//! tested to the millisecond.

use chrono::{DateTime, Duration, Utc};
use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of "now" for cache entry timestamps and TTL checks.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock with millisecond resolution.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { millis: AtomicI64::new(start.timestamp_millis()) }
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: std::time::Duration) {
        let delta = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.millis.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Age of something written at `written_at`, floored at zero when the clock went backwards.
pub(crate) fn age(now: DateTime<Utc>, written_at: DateTime<Utc>) -> Duration {
    let age = now.signed_duration_since(written_at);
    if age < Duration::zero() { Duration::zero() } else { age }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let start = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(std::time::Duration::from_millis(999));
        assert_eq!(clock.now(), start + Duration::milliseconds(999));
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::default();
        let at = DateTime::from_timestamp_millis(42).unwrap();
        clock.set(at);
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn test_age_floors_at_zero() {
        let now = DateTime::from_timestamp_millis(1_000).unwrap();
        let later = DateTime::from_timestamp_millis(5_000).unwrap();
        assert_eq!(age(now, later), Duration::zero());
        assert_eq!(age(later, now), Duration::milliseconds(4_000));
    }
}
