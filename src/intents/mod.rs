//! Background actions invokable from outside the foreground app.
//!
//! Widget buttons, shortcuts and the CLI all run these actions. Each one
//! goes through [`TimerController`], so the record write and the fan-out
//! are identical to the foreground path.

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::control::TimerController;
use crate::store::TimerStore;
use crate::types::{TimerRecord, TimerState};

/// A background timer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Intent {
    /// Start again with the last configured duration
    StartFromIdle,
    /// Start a fresh run of `minutes`
    StartWithDuration { minutes: u32 },
    Pause,
    Resume,
    Stop,
}

impl Intent {
    /// The action a widget offers for a display state.
    pub fn for_display_state(state: TimerState) -> Self {
        match state {
            TimerState::Running => Intent::Pause,
            TimerState::Paused => Intent::Resume,
            TimerState::Idle => Intent::StartFromIdle,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Intent::StartFromIdle => "Start Last Timer",
            Intent::StartWithDuration { .. } => "Start Timer",
            Intent::Pause => "Pause Timer",
            Intent::Resume => "Resume Timer",
            Intent::Stop => "Stop Timer",
        }
    }

    /// Runs the action and returns the record now in effect.
    pub fn perform<S: TimerStore, C: Clock>(&self, controller: &TimerController<S, C>) -> TimerRecord {
        tracing::debug!(intent = self.title(), "アクションを実行します");
        match *self {
            Intent::StartFromIdle => controller.start_last(),
            Intent::StartWithDuration { minutes } => {
                controller.start(f64::from(minutes) * 60.0, false)
            }
            Intent::Pause => controller.pause(),
            Intent::Resume => controller.resume(),
            Intent::Stop => controller.stop(),
        }
    }
}
