//! Home-screen widget timeline.
//!
//! The widget renderer cannot run continuously. Each time its host is asked
//! to reload, it reads the store once, derives a single timeline entry and
//! schedules its next refresh:
//! - Running: refresh exactly at the end instant, to flip to the idle face
//! - Otherwise: refresh after the idle horizon (15 minutes by default)
//!
//! The countdown between refreshes is rendered from `end_date` by the
//! system, so no push-tick is needed.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::derive::derive;
use crate::fanout::{FanOutError, WidgetHost};
use crate::intents::Intent;
use crate::store::TimerStore;
use crate::types::{TimerRecord, TimerState};

/// Default refresh horizon while not running (15 minutes).
pub const IDLE_REFRESH_SECS: i64 = 15 * 60;

/// Duration shown by placeholder entries (25 minutes).
const PLACEHOLDER_DURATION_SECS: f64 = 25.0 * 60.0;

/// File name the timeline is published under.
pub const TIMELINE_FILE_NAME: &str = "widget_timeline.json";

// ============================================================================
// Timeline
// ============================================================================

/// One rendered widget state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Instant the entry was computed for
    pub date: DateTime<Utc>,
    /// Display state after derivation
    pub state: TimerState,
    /// Countdown target while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Configured duration of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_duration: Option<f64>,
    /// Frozen time left while paused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
    /// What tapping the widget does
    pub action: Intent,
}

impl TimelineEntry {
    /// Builds the entry for `record` as seen at `now`.
    pub fn from_record(record: &TimerRecord, now: DateTime<Utc>) -> Self {
        let derived = derive(record, now);

        let (end_date, remaining) = match derived.display_state {
            TimerState::Running => (record.end_date, None),
            TimerState::Paused => (None, Some(derived.remaining_seconds)),
            TimerState::Idle => (None, None),
        };

        Self {
            date: now,
            state: derived.display_state,
            end_date,
            original_duration: record.original_duration,
            remaining,
            action: Intent::for_display_state(derived.display_state),
        }
    }

    /// Entry shown before any data is available.
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        Self {
            date: now,
            state: TimerState::Idle,
            end_date: None,
            original_duration: Some(PLACEHOLDER_DURATION_SECS),
            remaining: None,
            action: Intent::StartFromIdle,
        }
    }
}

/// Entries plus the instant the host should ask again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub refresh_at: DateTime<Utc>,
}

impl Timeline {
    /// Computes the timeline for `record` at `now`.
    pub fn for_record(record: &TimerRecord, now: DateTime<Utc>, idle_refresh_secs: i64) -> Self {
        let entry = TimelineEntry::from_record(record, now);

        let refresh_at = match (entry.state, entry.end_date) {
            (TimerState::Running, Some(end_date)) => end_date,
            _ => idle_refresh_at(now, idle_refresh_secs),
        };

        Self {
            entries: vec![entry],
            refresh_at,
        }
    }

    /// The entry to show right now.
    pub fn current(&self) -> Option<&TimelineEntry> {
        self.entries.first()
    }
}

/// `now + secs`, falling back to [`IDLE_REFRESH_SECS`] for values that are
/// not positive or overflow the calendar.
fn idle_refresh_at(now: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    let fallback = now + Duration::seconds(IDLE_REFRESH_SECS);
    if secs <= 0 {
        return fallback;
    }
    Duration::try_seconds(secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or_else(|| {
            tracing::warn!(secs, "ウィジェットの更新間隔が範囲外のため既定値を使います");
            fallback
        })
}

// ============================================================================
// TimelineFileHost
// ============================================================================

/// Widget host that publishes the recomputed timeline as a JSON file.
///
/// The widget renderer process reads the published file; a reload request
/// is therefore a recompute from the store plus an atomic file replace.
pub struct TimelineFileHost<S, C> {
    store: S,
    clock: C,
    path: PathBuf,
    idle_refresh_secs: i64,
}

impl<S: TimerStore, C: Clock> TimelineFileHost<S, C> {
    pub fn new(store: S, clock: C, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            clock,
            path: path.into(),
            idle_refresh_secs: IDLE_REFRESH_SECS,
        }
    }

    #[must_use]
    pub fn with_idle_refresh_secs(mut self, seconds: i64) -> Self {
        self.idle_refresh_secs = seconds;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Computes the timeline without publishing it.
    pub fn timeline(&self) -> Timeline {
        Timeline::for_record(&self.store.read(), self.clock.now(), self.idle_refresh_secs)
    }

    /// Reads the last published timeline, if any.
    pub fn published(&self) -> Option<Timeline> {
        let bytes = fs::read(&self.path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn publish(&self, timeline: &Timeline) -> std::io::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(timeline)?;
        let tmp_path = dir.join(format!(".{}.{}.tmp", TIMELINE_FILE_NAME, uuid::Uuid::new_v4()));
        let result = (|| {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&json)?;
            fs::rename(&tmp_path, &self.path)
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }
}

impl<S: TimerStore, C: Clock> WidgetHost for TimelineFileHost<S, C> {
    async fn reload_all_timelines(&self) -> Result<(), FanOutError> {
        let timeline = self.timeline();
        self.publish(&timeline)
            .map_err(|e| FanOutError::Widget(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(refresh_at = %timeline.refresh_at, "ウィジェットのタイムラインを更新しました");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeZone;

    use crate::clock::{add_seconds, ManualClock};
    use crate::store::MemoryStore;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap()
    }

    fn running(end_offset: f64) -> TimerRecord {
        TimerRecord {
            state: TimerState::Running,
            end_date: Some(add_seconds(t0(), end_offset)),
            original_duration: Some(1500.0),
            remaining_duration: None,
            last_configured_duration: Some(1500.0),
        }
    }

    mod timeline_tests {
        use super::*;

        #[test]
        fn test_running_refreshes_at_end() {
            let timeline = Timeline::for_record(&running(1500.0), t0(), IDLE_REFRESH_SECS);

            let entry = timeline.current().unwrap();
            assert_eq!(entry.state, TimerState::Running);
            assert_eq!(entry.end_date, Some(add_seconds(t0(), 1500.0)));
            assert_eq!(entry.action, Intent::Pause);
            assert_eq!(timeline.refresh_at, add_seconds(t0(), 1500.0));
        }

        #[test]
        fn test_expired_running_renders_idle() {
            let timeline = Timeline::for_record(&running(-5.0), t0(), IDLE_REFRESH_SECS);

            let entry = timeline.current().unwrap();
            assert_eq!(entry.state, TimerState::Idle);
            assert_eq!(entry.end_date, None);
            assert_eq!(entry.action, Intent::StartFromIdle);
            assert_eq!(timeline.refresh_at, t0() + Duration::minutes(15));
        }

        #[test]
        fn test_paused_offers_resume() {
            let record = TimerRecord {
                state: TimerState::Paused,
                original_duration: Some(1500.0),
                remaining_duration: Some(1490.0),
                ..TimerRecord::idle()
            };

            let timeline = Timeline::for_record(&record, t0(), 60);

            let entry = timeline.current().unwrap();
            assert_eq!(entry.state, TimerState::Paused);
            assert_eq!(entry.remaining, Some(1490.0));
            assert_eq!(entry.action, Intent::Resume);
            assert_eq!(timeline.refresh_at, t0() + Duration::seconds(60));
        }

        #[test]
        fn test_out_of_range_refresh_interval_falls_back() {
            let idle = TimerRecord::idle();
            let fallback = t0() + Duration::seconds(IDLE_REFRESH_SECS);

            for secs in [9_000_000_000_000, i64::MAX, 0, -60] {
                let timeline = Timeline::for_record(&idle, t0(), secs);
                assert_eq!(timeline.refresh_at, fallback, "secs = {}", secs);
            }
        }

        #[test]
        fn test_placeholder_is_idle_25_minutes() {
            let entry = TimelineEntry::placeholder(t0());
            assert_eq!(entry.state, TimerState::Idle);
            assert_eq!(entry.original_duration, Some(1500.0));
            assert_eq!(entry.action, Intent::StartFromIdle);
        }
    }

    mod host_tests {
        use super::*;

        #[tokio::test]
        async fn test_reload_publishes_timeline() {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(MemoryStore::with_record(running(1500.0)));
            let clock = Arc::new(ManualClock::new(t0()));
            let host = TimelineFileHost::new(
                store.clone(),
                clock.clone(),
                dir.path().join(TIMELINE_FILE_NAME),
            );

            host.reload_all_timelines().await.unwrap();

            let published = host.published().unwrap();
            assert_eq!(published.current().unwrap().state, TimerState::Running);
            assert_eq!(published.refresh_at, add_seconds(t0(), 1500.0));
        }

        #[tokio::test]
        async fn test_reload_reflects_latest_store() {
            let dir = tempfile::tempdir().unwrap();
            let store = Arc::new(MemoryStore::with_record(running(1500.0)));
            let clock = Arc::new(ManualClock::new(t0()));
            let host = TimelineFileHost::new(
                store.clone(),
                clock.clone(),
                dir.path().join(TIMELINE_FILE_NAME),
            );
            host.reload_all_timelines().await.unwrap();

            store.replace(TimerRecord::idle());
            host.reload_all_timelines().await.unwrap();

            let published = host.published().unwrap();
            assert_eq!(published.current().unwrap().state, TimerState::Idle);
        }

        #[tokio::test]
        async fn test_unwritable_path_reports_widget_error() {
            let dir = tempfile::tempdir().unwrap();
            let blocker = dir.path().join("blocker");
            fs::write(&blocker, "file, not a directory").unwrap();

            let host = TimelineFileHost::new(
                MemoryStore::new(),
                ManualClock::new(t0()),
                blocker.join(TIMELINE_FILE_NAME),
            );

            let result = host.reload_all_timelines().await;
            assert!(matches!(result, Err(FanOutError::Widget(_))));
        }
    }
}
