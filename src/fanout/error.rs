//! Fan-out error types.
//!
//! None of these reach the user: the dispatcher logs them and moves on to
//! the next sink.

use thiserror::Error;

/// Errors reported by a fan-out sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FanOutError {
    /// The widget host could not recompute its timeline.
    #[error("ウィジェットの更新に失敗しました: {0}")]
    Widget(String),

    /// The live display could not be started or ended.
    #[error("ライブアクティビティの操作に失敗しました: {0}")]
    LiveDisplay(String),

    /// The push to the companion device failed.
    #[error("コンパニオンへの送信に失敗しました: {0}")]
    Companion(String),

    /// No companion device is listening.
    #[error("コンパニオンデバイスに到達できません")]
    CompanionUnreachable,
}

impl FanOutError {
    /// Returns true for the expected "nobody is listening" case.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::CompanionUnreachable)
    }
}
