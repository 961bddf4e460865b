//! Core data types for the Pomodoro Cube timer.
//!
//! This module defines the data structures used for:
//! - The persisted timer record shared by every surface
//! - The derived view every renderer computes from it
//! - The summary pushed to a paired companion device

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// TimerState
// ============================================================================

/// Lifecycle phase of the single shared timer.
///
/// The same enum doubles as the display state produced by derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// No timer is active
    Idle,
    /// Counting down towards `end_date`
    Running,
    /// Frozen with a captured remaining duration
    Paused,
}

impl TimerState {
    /// Returns the string representation stored under `timerState`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
        }
    }

    /// Returns true for Running and Paused.
    pub fn is_active(&self) -> bool {
        !matches!(self, TimerState::Idle)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::Idle
    }
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerRecord
// ============================================================================

/// The single persisted source of truth for the timer.
///
/// Field names match the keys of the shared key-value bag, so a record
/// written by one process can be read field-for-field by any other. Absent
/// keys deserialize to the Idle default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    /// Current lifecycle phase
    #[serde(rename = "timerState", default)]
    pub state: TimerState,
    /// Absolute instant a Running timer reaches zero
    #[serde(rename = "timerEndDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Duration configured for the current or most recent run (seconds)
    #[serde(rename = "originalDuration", default, skip_serializing_if = "Option::is_none")]
    pub original_duration: Option<f64>,
    /// Time left captured when pausing (seconds)
    #[serde(rename = "remainingDuration", default, skip_serializing_if = "Option::is_none")]
    pub remaining_duration: Option<f64>,
    /// Sticky duration of the last fresh start (seconds)
    #[serde(
        rename = "lastConfiguredDuration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_configured_duration: Option<f64>,
}

impl TimerRecord {
    /// Creates an Idle record with no sticky preference.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Returns the duration a background "start last timer" action should use.
    ///
    /// Falls back to `default` when nothing positive has been stored yet.
    pub fn last_duration(&self, default: f64) -> f64 {
        match self.last_configured_duration {
            Some(duration) if duration > 0.0 => duration,
            _ => default,
        }
    }

    /// Checks the presence rules of the persisted keys.
    ///
    /// Running carries only `end_date`, Paused carries only
    /// `remaining_duration`, and both carry `original_duration`. Idle carries
    /// none of the three.
    pub fn is_consistent(&self) -> bool {
        match self.state {
            TimerState::Running => {
                self.end_date.is_some()
                    && self.remaining_duration.is_none()
                    && self.original_duration.is_some()
            }
            TimerState::Paused => {
                self.end_date.is_none()
                    && self.remaining_duration.is_some()
                    && self.original_duration.is_some()
            }
            TimerState::Idle => {
                self.end_date.is_none()
                    && self.remaining_duration.is_none()
                    && self.original_duration.is_none()
            }
        }
    }
}

// ============================================================================
// DerivedState
// ============================================================================

/// What a renderer should show for a record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedState {
    /// Display phase after lazy expiry has been applied
    pub display_state: TimerState,
    /// Seconds left; zero when idle
    pub remaining_seconds: f64,
}

impl DerivedState {
    /// The `(Idle, 0)` pair.
    pub fn idle() -> Self {
        Self {
            display_state: TimerState::Idle,
            remaining_seconds: 0.0,
        }
    }

    /// Remaining time rounded up to whole seconds for countdown text.
    pub fn display_seconds(&self) -> u64 {
        if self.remaining_seconds <= 0.0 {
            0
        } else {
            self.remaining_seconds.ceil() as u64
        }
    }
}

impl Default for DerivedState {
    fn default() -> Self {
        Self::idle()
    }
}

// ============================================================================
// CompanionMessage
// ============================================================================

/// Fire-and-forget summary pushed to a paired companion device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionMessage {
    /// Lifecycle phase as written to the store
    pub state: TimerState,
    /// End instant while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Configured duration of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_duration: Option<f64>,
    /// Frozen remaining time while paused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
}

impl CompanionMessage {
    /// Builds the summary for a freshly written record.
    pub fn from_record(record: &TimerRecord) -> Self {
        Self {
            state: record.state,
            end_date: record.end_date,
            original_duration: record.original_duration,
            remaining: record.remaining_duration,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
