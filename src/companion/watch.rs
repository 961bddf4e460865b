//! Companion-side timer model.
//!
//! The companion keeps its own preset list and its own 1 Hz countdown. It
//! never writes the phone's record; the last phone summary is stored only
//! so it can be shown alongside.

use chrono::{DateTime, Utc};

use crate::derive::derive;
use crate::faces::{watch_faces, CubeFace};
use crate::types::{CompanionMessage, DerivedState, TimerRecord};

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchTick {
    /// Not running; nothing changed
    Idle,
    /// One second elapsed; seconds left
    Ticked(f64),
    /// The countdown just reached zero
    Completed,
}

/// Companion timer state.
#[derive(Debug, Clone)]
pub struct WatchModel {
    faces: Vec<CubeFace>,
    selected: usize,
    time_remaining: f64,
    running: bool,
    phone_context: Option<CompanionMessage>,
}

impl Default for WatchModel {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchModel {
    pub fn new() -> Self {
        Self::with_faces(watch_faces())
    }

    /// A model over a custom preset list.
    pub fn with_faces(faces: Vec<CubeFace>) -> Self {
        Self {
            faces,
            selected: 0,
            time_remaining: 0.0,
            running: false,
            phone_context: None,
        }
    }

    pub fn faces(&self) -> &[CubeFace] {
        &self.faces
    }

    pub fn selected_face(&self) -> Option<&CubeFace> {
        self.faces.get(self.selected)
    }

    pub fn time_remaining(&self) -> f64 {
        self.time_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Selects a preset by index.
    ///
    /// A running countdown keeps going; the new preset applies from the
    /// next start.
    pub fn select_face(&mut self, index: usize) -> bool {
        if index >= self.faces.len() {
            return false;
        }
        self.selected = index;
        true
    }

    /// Selects a preset by name, ignoring case.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        match self
            .faces
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
        {
            Some(index) => self.select_face(index),
            None => false,
        }
    }

    pub fn next_face(&mut self) -> bool {
        let count = self.faces.len();
        if count == 0 {
            return false;
        }
        self.select_face((self.selected + 1) % count)
    }

    pub fn previous_face(&mut self) -> bool {
        let count = self.faces.len();
        if count == 0 {
            return false;
        }
        self.select_face((self.selected + count - 1) % count)
    }

    /// Starts counting down the selected preset. A second start while
    /// running is ignored.
    pub fn start(&mut self) -> bool {
        let duration = self.selected_face().map_or(0.0, |f| f.duration);
        if self.running || duration <= 0.0 {
            return false;
        }
        self.time_remaining = duration;
        self.running = true;
        true
    }

    /// Stops and clears the countdown.
    pub fn stop(&mut self) {
        self.running = false;
        self.time_remaining = 0.0;
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> WatchTick {
        if !self.running {
            return WatchTick::Idle;
        }

        self.time_remaining = (self.time_remaining - 1.0).max(0.0);
        if self.time_remaining > 0.0 {
            return WatchTick::Ticked(self.time_remaining);
        }

        self.stop();
        WatchTick::Completed
    }

    /// Stores the latest phone summary. The local countdown is untouched.
    pub fn apply_phone_context(&mut self, message: CompanionMessage) {
        self.phone_context = Some(message);
    }

    pub fn phone_context(&self) -> Option<&CompanionMessage> {
        self.phone_context.as_ref()
    }

    /// The phone timer as it should look at `now`, if any summary arrived.
    pub fn phone_view(&self, now: DateTime<Utc>) -> Option<DerivedState> {
        let message = self.phone_context.as_ref()?;
        let record = TimerRecord {
            state: message.state,
            end_date: message.end_date,
            original_duration: message.original_duration,
            remaining_duration: message.remaining,
            last_configured_duration: None,
        };
        Some(derive(&record, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::add_seconds;
    use crate::types::TimerState;
    use chrono::TimeZone;

    fn short_model() -> WatchModel {
        WatchModel::with_faces(vec![CubeFace::new(0, "Blink", "red", 3.0)])
    }

    #[test]
    fn test_initial_state() {
        let model = WatchModel::new();
        assert_eq!(model.selected_face().unwrap().name, "Focus");
        assert_eq!(model.time_remaining(), 0.0);
        assert!(!model.is_running());
        assert!(model.phone_context().is_none());
    }

    #[test]
    fn test_face_navigation_wraps() {
        let mut model = WatchModel::new();

        assert!(model.previous_face());
        assert_eq!(model.selected_face().unwrap().name, "Hour");

        assert!(model.next_face());
        assert_eq!(model.selected_face().unwrap().name, "Focus");
        assert!(!model.select_face(6));
    }

    #[test]
    fn test_select_by_name() {
        let mut model = WatchModel::new();

        assert!(model.select_by_name(" quick "));
        assert_eq!(model.selected_face().unwrap().duration, 600.0);
        assert!(!model.select_by_name("Nope"));
        assert_eq!(model.selected_face().unwrap().name, "Quick");
    }

    #[test]
    fn test_selection_while_running_keeps_countdown() {
        let mut model = WatchModel::new();
        model.start();
        assert_eq!(model.time_remaining(), 1500.0);

        assert!(model.select_face(2));
        assert_eq!(model.selected_face().unwrap().name, "Long");
        assert!(model.is_running());
        assert_eq!(model.time_remaining(), 1500.0);

        model.stop();
        model.start();
        assert_eq!(model.time_remaining(), 900.0);
    }

    #[test]
    fn test_second_start_ignored() {
        let mut model = WatchModel::new();
        assert!(model.start());
        assert!(!model.start());
    }

    #[test]
    fn test_countdown_completes_and_resets() {
        let mut model = short_model();
        assert_eq!(model.tick(), WatchTick::Idle);

        model.start();
        assert_eq!(model.tick(), WatchTick::Ticked(2.0));
        assert_eq!(model.tick(), WatchTick::Ticked(1.0));
        assert_eq!(model.tick(), WatchTick::Completed);

        assert!(!model.is_running());
        assert_eq!(model.time_remaining(), 0.0);
        assert_eq!(model.tick(), WatchTick::Idle);
    }

    #[test]
    fn test_phone_context_does_not_drive_countdown() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap();
        let mut model = WatchModel::new();

        model.apply_phone_context(CompanionMessage {
            state: TimerState::Running,
            end_date: Some(add_seconds(now, 300.0)),
            original_duration: Some(300.0),
            remaining: None,
        });

        assert!(!model.is_running());
        assert_eq!(model.time_remaining(), 0.0);

        let view = model.phone_view(now).unwrap();
        assert_eq!(view.display_state, TimerState::Running);
        assert_eq!(view.remaining_seconds, 300.0);

        let later = model.phone_view(add_seconds(now, 301.0)).unwrap();
        assert_eq!(later, DerivedState::idle());
    }
}
