//! Wall-clock access for the timer core.
//!
//! Every decision in the core is made against an explicit `now`, so tests
//! can drive time with [`ManualClock`] instead of sleeping.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of the current wall-clock instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.lock() = instant;
    }

    pub fn advance_secs(&self, seconds: f64) {
        let mut now = self.lock();
        *now = add_seconds(*now, seconds);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned clock still holds a valid instant.
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Returns `instant + seconds` at microsecond precision.
pub fn add_seconds(instant: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    instant + Duration::microseconds((seconds * 1_000_000.0).round() as i64)
}

/// Returns `later - earlier` in fractional seconds (negative if `later` is earlier).
pub fn seconds_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);

        clock.advance_secs(90.5);

        assert_eq!(seconds_between(clock.now(), start), 90.5);
    }

    #[test]
    fn test_add_and_subtract_are_inverse() {
        let start = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let end = add_seconds(start, 1490.0);

        assert_eq!(seconds_between(end, start), 1490.0);
        assert_eq!(seconds_between(start, end), -1490.0);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
