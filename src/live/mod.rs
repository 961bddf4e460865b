//! Lock-screen live activities.
//!
//! A live activity is a system-rendered countdown to a fixed end instant.
//! Each activity is published as its own JSON file under an `activities`
//! directory so any process can list or end them, including activities
//! started by another process.
//!
//! There is no paused visual: pause and stop both end every activity, and
//! a resume starts a fresh one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::derive::derive;
use crate::fanout::{FanOutError, LiveDisplay};
use crate::types::{DerivedState, TimerRecord, TimerState};

/// Name of the directory holding one file per activity.
pub const ACTIVITIES_DIR_NAME: &str = "activities";

/// Default activity title.
pub const DEFAULT_ACTIVITY_NAME: &str = "Focus Session";

/// Static attributes fixed for the lifetime of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityAttributes {
    pub timer_name: String,
}

/// Dynamic state of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityContent {
    pub end_date: DateTime<Utc>,
}

/// One published live activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveActivity {
    pub id: Uuid,
    pub attributes: ActivityAttributes,
    pub content: ActivityContent,
    pub started_at: DateTime<Utc>,
}

impl LiveActivity {
    /// What the lock screen shows for this activity at `now`.
    ///
    /// Goes through the same derivation as every other renderer so a
    /// countdown that reached its end shows idle.
    pub fn derived(&self, now: DateTime<Utc>) -> DerivedState {
        let record = TimerRecord {
            state: TimerState::Running,
            end_date: Some(self.content.end_date),
            ..TimerRecord::idle()
        };
        derive(&record, now)
    }
}

/// File-backed live activity manager.
#[derive(Debug, Clone)]
pub struct LiveActivityManager<C = SystemClock> {
    dir: PathBuf,
    timer_name: String,
    enabled: bool,
    clock: C,
}

impl LiveActivityManager {
    /// Creates a manager publishing into `<namespace_dir>/activities`.
    pub fn new(namespace_dir: &Path) -> Self {
        Self {
            dir: namespace_dir.join(ACTIVITIES_DIR_NAME),
            timer_name: DEFAULT_ACTIVITY_NAME.to_string(),
            enabled: true,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> LiveActivityManager<C> {
    /// Stamps new activities with `clock` instead of the system clock.
    pub fn with_clock<K: Clock>(self, clock: K) -> LiveActivityManager<K> {
        LiveActivityManager {
            dir: self.dir,
            timer_name: self.timer_name,
            enabled: self.enabled,
            clock,
        }
    }

    #[must_use]
    pub fn with_timer_name(mut self, name: impl Into<String>) -> Self {
        self.timer_name = name.into();
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists every published activity, oldest first.
    ///
    /// Unreadable entries are skipped.
    pub fn activities(&self) -> Vec<LiveActivity> {
        let mut activities: Vec<LiveActivity> = self
            .activity_files()
            .into_iter()
            .filter_map(|path| {
                let bytes = fs::read(&path).ok()?;
                match serde_json::from_slice(&bytes) {
                    Ok(activity) => Some(activity),
                    Err(e) => {
                        tracing::warn!("ライブアクティビティを読み込めません ({}): {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();
        activities.sort_by_key(|a| a.started_at);
        activities
    }

    fn activity_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }

    /// Publishes `activity` through a temp file renamed into place, so
    /// readers never see a partial file.
    fn publish(&self, activity: &LiveActivity) -> Result<PathBuf, FanOutError> {
        fs::create_dir_all(&self.dir).map_err(|e| self.error("作成", e))?;
        let json = serde_json::to_vec_pretty(activity).map_err(|e| self.error("変換", e))?;

        let path = self.dir.join(format!("{}.json", activity.id));
        let tmp_path = self.dir.join(format!(".{}.tmp", activity.id));
        let result = (|| {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(self.error("書き込み", e));
        }
        Ok(path)
    }

    fn error(&self, action: &str, e: impl std::fmt::Display) -> FanOutError {
        FanOutError::LiveDisplay(format!("{} ({}): {}", action, self.dir.display(), e))
    }
}

impl<C: Clock> LiveDisplay for LiveActivityManager<C> {
    async fn start(&self, end_date: DateTime<Utc>) -> Result<(), FanOutError> {
        let activity = LiveActivity {
            id: Uuid::new_v4(),
            attributes: ActivityAttributes {
                timer_name: self.timer_name.clone(),
            },
            content: ActivityContent { end_date },
            started_at: self.clock.now(),
        };

        self.publish(&activity)?;

        tracing::debug!(id = %activity.id, end_date = %end_date, "ライブアクティビティを開始しました");
        Ok(())
    }

    async fn end_all(&self) -> Result<(), FanOutError> {
        let mut first_error = None;
        let mut ended = 0usize;

        for path in self.activity_files() {
            match fs::remove_file(&path) {
                Ok(()) => ended += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    first_error.get_or_insert_with(|| self.error("終了", e));
                }
            }
        }

        tracing::debug!(ended, "ライブアクティビティを終了しました");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// ============================================================================
// Tests
// ============================================================================
