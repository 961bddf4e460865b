//! The shared derivation rule.
//!
//! Every surface (foreground app, widget timeline, live display, CLI status)
//! turns a point-in-time [`TimerRecord`] plus the current wall-clock time into
//! what it displays through [`derive`]. Nothing here touches the store.

use chrono::{DateTime, Utc};

use crate::clock::seconds_between;
use crate::types::{DerivedState, TimerRecord, TimerState};

/// Computes `(display_state, remaining_seconds)` for `record` at `now`.
///
/// A Running record whose end instant has passed reads as `(Idle, 0)`
/// (lazy expiry). A Paused record reports its frozen snapshot verbatim.
/// Records missing the field their state requires read as Idle.
pub fn derive(record: &TimerRecord, now: DateTime<Utc>) -> DerivedState {
    match record.state {
        TimerState::Running => match record.end_date {
            Some(end_date) => {
                let remaining = seconds_between(end_date, now);
                if remaining > 0.0 {
                    DerivedState {
                        display_state: TimerState::Running,
                        remaining_seconds: remaining,
                    }
                } else {
                    DerivedState::idle()
                }
            }
            None => DerivedState::idle(),
        },
        TimerState::Paused => match record.remaining_duration {
            Some(remaining) => DerivedState {
                display_state: TimerState::Paused,
                remaining_seconds: remaining,
            },
            None => DerivedState::idle(),
        },
        TimerState::Idle => DerivedState::idle(),
    }
}

/// Returns true when `record` says Running but its end instant has passed.
pub fn is_expired(record: &TimerRecord, now: DateTime<Utc>) -> bool {
    record.state == TimerState::Running
        && derive(record, now).display_state == TimerState::Idle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::add_seconds;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap()
    }

    fn running(end_date: DateTime<Utc>, original: f64) -> TimerRecord {
        TimerRecord {
            state: TimerState::Running,
            end_date: Some(end_date),
            original_duration: Some(original),
            ..TimerRecord::idle()
        }
    }

    #[test]
    fn test_running_reports_time_to_end() {
        let record = running(add_seconds(t0(), 1500.0), 1500.0);

        let derived = derive(&record, add_seconds(t0(), 1.0));

        assert_eq!(derived.display_state, TimerState::Running);
        assert_eq!(derived.remaining_seconds, 1499.0);
    }

    #[test]
    fn test_running_at_end_instant_is_idle() {
        let record = running(add_seconds(t0(), 60.0), 60.0);

        assert_eq!(derive(&record, add_seconds(t0(), 60.0)), DerivedState::idle());
    }

    #[test]
    fn test_expired_stays_idle_on_every_read() {
        let record = running(add_seconds(t0(), 60.0), 60.0);

        for offset in [61.0, 120.0, 3600.0, 86_400.0] {
            let derived = derive(&record, add_seconds(t0(), offset));
            assert_eq!(derived, DerivedState::idle(), "offset {}", offset);
        }
        assert!(is_expired(&record, add_seconds(t0(), 61.0)));
        assert!(!is_expired(&record, add_seconds(t0(), 59.0)));
    }

    #[test]
    fn test_paused_is_frozen() {
        let record = TimerRecord {
            state: TimerState::Paused,
            original_duration: Some(1500.0),
            remaining_duration: Some(1490.0),
            ..TimerRecord::idle()
        };

        for offset in [0.0, 10.0, 10_000.0] {
            let derived = derive(&record, add_seconds(t0(), offset));
            assert_eq!(derived.display_state, TimerState::Paused);
            assert_eq!(derived.remaining_seconds, 1490.0);
        }
    }

    #[test]
    fn test_idle_is_zero() {
        assert_eq!(derive(&TimerRecord::idle(), t0()), DerivedState::idle());
    }

    #[test]
    fn test_incomplete_records_read_as_idle() {
        let running_without_end = TimerRecord {
            state: TimerState::Running,
            original_duration: Some(60.0),
            ..TimerRecord::idle()
        };
        let paused_without_snapshot = TimerRecord {
            state: TimerState::Paused,
            original_duration: Some(60.0),
            ..TimerRecord::idle()
        };

        assert_eq!(derive(&running_without_end, t0()), DerivedState::idle());
        assert_eq!(derive(&paused_without_snapshot, t0()), DerivedState::idle());
    }

    #[test]
    fn test_derive_does_not_touch_record() {
        let record = running(add_seconds(t0(), 10.0), 10.0);
        let before = record.clone();

        let _ = derive(&record, add_seconds(t0(), 20.0));

        assert_eq!(record, before);
    }
}
