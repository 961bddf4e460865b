//! Timer controller.
//!
//! Each operation is a full read-modify-write of the shared record followed
//! by a [`TimerChange`] event for the fan-out. Operations never fail:
//! invalid preconditions degrade to a no-op or to the nearest valid
//! transition, and a failed write is logged and leaves the store as it was.

use tokio::sync::mpsc;

use super::{TimerChange, Transition};
use crate::clock::{add_seconds, seconds_between, Clock};
use crate::derive::derive;
use crate::faces::{CubeFace, CubeMode, FaceCatalog};
use crate::store::TimerStore;
use crate::types::{DerivedState, TimerRecord, TimerState};

/// Default duration for a background start when nothing was configured (25 minutes).
pub const DEFAULT_DURATION_SECS: f64 = 25.0 * 60.0;

/// Longest accepted run (100 days); longer requests are clamped.
pub const MAX_DURATION_SECS: f64 = 100.0 * 24.0 * 60.0 * 60.0;

// ============================================================================
// TimerController
// ============================================================================

/// Mutates the shared timer record and announces each change.
pub struct TimerController<S, C> {
    /// Shared record storage
    store: S,
    /// Wall-clock source
    clock: C,
    /// Change sender for the fan-out
    change_tx: mpsc::UnboundedSender<TimerChange>,
    /// Duration used by `start_last` before any fresh start was recorded
    default_duration: f64,
}

impl<S: TimerStore, C: Clock> TimerController<S, C> {
    /// Creates a controller over `store` announcing changes on `change_tx`.
    pub fn new(store: S, clock: C, change_tx: mpsc::UnboundedSender<TimerChange>) -> Self {
        Self {
            store,
            clock,
            change_tx,
            default_duration: DEFAULT_DURATION_SECS,
        }
    }

    /// Overrides the fallback duration for `start_last`.
    #[must_use]
    pub fn with_default_duration(mut self, seconds: f64) -> Self {
        self.default_duration = sanitize_duration(seconds);
        self
    }

    /// Reads the current record.
    pub fn read(&self) -> TimerRecord {
        self.store.read()
    }

    /// Derives what a renderer would show right now.
    pub fn derived(&self) -> DerivedState {
        derive(&self.store.read(), self.clock.now())
    }

    /// Returns the duration a "start last timer" action uses.
    pub fn last_duration(&self) -> f64 {
        self.store.read().last_duration(self.default_duration)
    }

    /// Starts a run of `duration` seconds, replacing any current run.
    ///
    /// A fresh start (`is_resume == false`) also records `duration` as the
    /// sticky last configured duration.
    pub fn start(&self, duration: f64, is_resume: bool) -> TimerRecord {
        let duration = sanitize_duration(duration);
        let current = self.store.read();
        let now = self.clock.now();

        let record = TimerRecord {
            state: TimerState::Running,
            end_date: Some(add_seconds(now, duration)),
            original_duration: Some(duration),
            remaining_duration: None,
            last_configured_duration: if is_resume {
                current.last_configured_duration
            } else {
                Some(duration)
            },
        };

        tracing::info!(duration, is_resume, "タイマーを開始します");
        self.commit(current, record, Transition::Started { resumed: is_resume })
    }

    /// Starts a fresh run using the last configured duration.
    pub fn start_last(&self) -> TimerRecord {
        self.start(self.last_duration(), false)
    }

    /// Pauses a running timer, capturing the time left.
    ///
    /// Pausing a timer whose end instant has already passed stops it
    /// instead. Anything other than a Running record is left untouched.
    pub fn pause(&self) -> TimerRecord {
        let current = self.store.read();

        let end_date = match (current.state, current.end_date) {
            (TimerState::Running, Some(end_date)) => end_date,
            _ => {
                tracing::debug!(state = %current.state, "実行中ではないため一時停止をスキップします");
                return current;
            }
        };

        let remaining = seconds_between(end_date, self.clock.now());
        if remaining <= 0.0 {
            tracing::debug!("タイマーは既に終了しているため停止します");
            return self.stop();
        }

        let record = TimerRecord {
            state: TimerState::Paused,
            end_date: None,
            remaining_duration: Some(remaining),
            ..current.clone()
        };

        tracing::info!(remaining, "タイマーを一時停止します");
        self.commit(current, record, Transition::Paused)
    }

    /// Resumes a paused timer with its captured remaining time.
    ///
    /// No-op unless the record is Paused with a positive snapshot.
    pub fn resume(&self) -> TimerRecord {
        let current = self.store.read();

        match (current.state, current.remaining_duration) {
            (TimerState::Paused, Some(remaining)) if remaining > 0.0 => self.start(remaining, true),
            _ => {
                tracing::debug!(state = %current.state, "一時停止中ではないため再開をスキップします");
                current
            }
        }
    }

    /// Returns the timer to Idle, keeping the sticky last configured duration.
    ///
    /// Always writes and announces, even when already Idle.
    pub fn stop(&self) -> TimerRecord {
        let current = self.store.read();

        let record = TimerRecord {
            last_configured_duration: current.last_configured_duration,
            ..TimerRecord::idle()
        };

        tracing::info!("タイマーを停止します");
        self.commit(current, record, Transition::Stopped)
    }

    /// Selects a face: stops the current run, then starts the face's duration.
    pub fn select_face(&self, face: &CubeFace) -> TimerRecord {
        tracing::debug!(face = %face.name, "フェイスを選択しました");
        self.stop();
        self.start(face.duration, false)
    }

    /// Switches the cube to another preset set, stopping any current run.
    pub fn change_mode(&self, catalog: &mut FaceCatalog, mode: CubeMode) -> TimerRecord {
        catalog.change_mode(mode);
        self.stop()
    }

    /// Edits the custom face; restarts it when it is the selected face.
    ///
    /// Returns `None` when nothing was restarted.
    pub fn update_custom_duration(
        &self,
        catalog: &mut FaceCatalog,
        minutes: u32,
    ) -> Option<TimerRecord> {
        let face = catalog.update_custom_duration(minutes)?;
        Some(self.select_face(&face))
    }

    /// Persists `record` and announces it; on failure keeps `previous`.
    fn commit(
        &self,
        previous: TimerRecord,
        record: TimerRecord,
        transition: Transition,
    ) -> TimerRecord {
        if let Err(e) = self.store.write(&record) {
            tracing::warn!("タイマー状態の保存に失敗しました: {}", e);
            return previous;
        }

        let change = TimerChange {
            transition,
            record: record.clone(),
        };
        if self.change_tx.send(change).is_err() {
            tracing::debug!("変更通知の受信者がいません");
        }

        record
    }
}

/// Clamps a requested duration into `[0, MAX_DURATION_SECS]`.
fn sanitize_duration(seconds: f64) -> f64 {
    if seconds.is_nan() || seconds <= 0.0 {
        0.0
    } else {
        seconds.min(MAX_DURATION_SECS)
    }
}

// ============================================================================
// Tests
// ============================================================================
