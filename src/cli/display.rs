//! Display utilities for the Pomodoro Cube CLI.
//!
//! This module provides formatted output for:
//! - Transition results
//! - Status and live countdown lines
//! - Widget timeline, faces and companion context

use chrono::{DateTime, Local, Utc};

use crate::faces::{CubeFace, CubeMode};
use crate::live::LiveActivity;
use crate::types::{DerivedState, TimerRecord, TimerState};
use crate::widget::Timeline;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a start or start-last.
    pub fn show_started(record: &TimerRecord, derived: &DerivedState) {
        if derived.display_state != TimerState::Running {
            println!("タイマーを開始できませんでした");
            return;
        }
        println!("* タイマーを開始しました");
        Self::show_remaining(derived);
        if let Some(end_date) = record.end_date {
            println!("  終了予定: {}", Self::format_clock(end_date));
        }
    }

    /// Shows the result of a pause.
    pub fn show_paused(derived: &DerivedState) {
        match derived.display_state {
            TimerState::Paused => {
                println!("|| タイマーを一時停止しました");
                Self::show_remaining(derived);
            }
            TimerState::Idle => println!("タイマーは実行されていません"),
            TimerState::Running => println!("タイマーを一時停止できませんでした"),
        }
    }

    /// Shows the result of a resume.
    pub fn show_resumed(derived: &DerivedState) {
        match derived.display_state {
            TimerState::Running => {
                println!("> タイマーを再開しました");
                Self::show_remaining(derived);
            }
            _ => println!("一時停止中のタイマーはありません"),
        }
    }

    /// Shows the result of a stop.
    pub fn show_stopped() {
        println!("[] タイマーを停止しました");
    }

    /// Shows the face that was started.
    pub fn show_face_started(face: &CubeFace, record: &TimerRecord, derived: &DerivedState) {
        println!("フェイス: {} ({})", face.name, face.color);
        Self::show_started(record, derived);
    }

    /// Shows the current timer status.
    pub fn show_status(
        record: &TimerRecord,
        derived: &DerivedState,
        face: Option<&CubeFace>,
        activities: &[LiveActivity],
    ) {
        println!("Pomodoro Cube ステータス");
        println!("─────────────────────────────");
        println!("状態: {}", Self::state_label(derived.display_state));

        if derived.display_state.is_active() {
            if let Some(face) = face {
                println!("  フェイス: {} ({})", face.name, face.color);
            }
            Self::show_remaining(derived);
            if let Some(original) = record.original_duration {
                let (minutes, seconds) = Self::format_time(original.max(0.0).ceil() as u64);
                println!("  設定時間: {}:{:02}", minutes, seconds);
            }
        } else if record.state == TimerState::Running {
            println!("  タイマーは終了しました");
        }

        if let Some(last) = record.last_configured_duration {
            let (minutes, seconds) = Self::format_time(last.max(0.0).ceil() as u64);
            println!("前回の設定: {}:{:02}", minutes, seconds);
        }
        if !activities.is_empty() {
            println!("ライブアクティビティ: {}件", activities.len());
        }
    }

    /// Shows one line of the live countdown.
    pub fn show_tick(derived: &DerivedState) {
        let (minutes, seconds) = Self::format_time(derived.display_seconds());
        println!(
            "{} {}:{:02}",
            Self::state_label(derived.display_state),
            minutes,
            seconds
        );
    }

    /// Shows that a followed timer has finished.
    pub fn show_finished() {
        println!("* タイマーが終了しました");
    }

    /// Shows the widget timeline.
    pub fn show_timeline(timeline: &Timeline) {
        println!("ウィジェット");
        println!("─────────────────────────────");
        for entry in &timeline.entries {
            println!("状態: {}", Self::state_label(entry.state));
            match (entry.end_date, entry.remaining) {
                (Some(end_date), _) => println!("  終了予定: {}", Self::format_clock(end_date)),
                (None, Some(remaining)) => {
                    let (minutes, seconds) = Self::format_time(remaining.max(0.0).ceil() as u64);
                    println!("  残り時間: {}:{:02}", minutes, seconds);
                }
                (None, None) => {}
            }
            println!("  ボタン: {}", entry.action.title());
        }
        println!("次回更新: {}", Self::format_clock(timeline.refresh_at));
    }

    /// Lists the faces of a mode.
    pub fn show_faces(mode: CubeMode, faces: &[CubeFace]) {
        println!("{} モード", mode.as_str());
        for face in faces {
            let (minutes, seconds) = Self::format_time(face.duration.ceil() as u64);
            println!(
                "  [{}] {:<12} {:>3}:{:02}  {}",
                face.id, face.name, minutes, seconds, face.color
            );
        }
    }

    /// Shows the custom face's new duration.
    pub fn show_custom_updated(minutes: u32) {
        println!("Custom フェイスを {} 分に設定しました", minutes);
    }

    /// Shows the phone timer as seen from the companion.
    pub fn show_phone_view(view: &DerivedState) {
        print!("phone: ");
        Self::show_tick(view);
    }

    /// Shows one step of the companion's own countdown.
    pub fn show_watch_tick(seconds: f64) {
        let (minutes, seconds) = Self::format_time(seconds.max(0.0).ceil() as u64);
        println!("watch: {}:{:02}", minutes, seconds);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn show_remaining(derived: &DerivedState) {
        let (minutes, seconds) = Self::format_time(derived.display_seconds());
        println!("  残り時間: {}:{:02}", minutes, seconds);
    }

    fn state_label(state: TimerState) -> &'static str {
        match state {
            TimerState::Idle => "待機中",
            TimerState::Running => "実行中",
            TimerState::Paused => "一時停止中",
        }
    }

    fn format_clock(instant: DateTime<Utc>) -> String {
        instant.with_timezone(&Local).format("%H:%M:%S").to_string()
    }

    /// Formats remaining seconds as (minutes, seconds).
    fn format_time(total_seconds: u64) -> (u64, u64) {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        (minutes, seconds)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod format_time_tests {
        use super::*;

        #[test]
        fn test_format_time_zero() {
            assert_eq!(Display::format_time(0), (0, 0));
        }

        #[test]
        fn test_format_time_mixed() {
            assert_eq!(Display::format_time(90), (1, 30));
        }

        #[test]
        fn test_format_time_25_minutes() {
            assert_eq!(Display::format_time(25 * 60), (25, 0));
        }

        #[test]
        fn test_format_time_over_an_hour() {
            assert_eq!(Display::format_time(120 * 60 + 59), (120, 59));
        }
    }

    mod label_tests {
        use super::*;

        #[test]
        fn test_state_labels() {
            assert_eq!(Display::state_label(TimerState::Idle), "待機中");
            assert_eq!(Display::state_label(TimerState::Running), "実行中");
            assert_eq!(Display::state_label(TimerState::Paused), "一時停止中");
        }
    }

    mod display_tests {
        use super::*;
        use crate::faces::faces_for_mode;
        use crate::widget::TimelineEntry;

        #[test]
        fn test_show_functions_do_not_panic() {
            let now = Utc::now();
            let paused = DerivedState {
                display_state: TimerState::Paused,
                remaining_seconds: 42.5,
            };

            Display::show_started(&TimerRecord::idle(), &DerivedState::idle());
            Display::show_paused(&paused);
            Display::show_resumed(&DerivedState::idle());
            Display::show_stopped();
            Display::show_status(&TimerRecord::idle(), &DerivedState::idle(), None, &[]);
            Display::show_status(
                &TimerRecord::idle(),
                &paused,
                faces_for_mode(CubeMode::Focus).first(),
                &[],
            );
            Display::show_tick(&paused);
            Display::show_finished();
            Display::show_faces(CubeMode::Gym, &faces_for_mode(CubeMode::Gym));
            Display::show_timeline(&Timeline {
                entries: vec![TimelineEntry::placeholder(now)],
                refresh_at: now,
            });
            Display::show_phone_view(&paused);
            Display::show_watch_tick(59.0);
            Display::show_custom_updated(12);
            Display::show_error("test");
        }
    }
}
