//! Notification fan-out after each timer mutation.
//!
//! The controller emits a [`TimerChange`] once the new record is durable.
//! [`FanOut`] turns each change into three independent, best-effort side
//! effects:
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │   TimerChange    │
//!                  └────────┬─────────┘
//!            ┌──────────────┼───────────────┐
//!            ▼              ▼               ▼
//!   ┌────────────────┐ ┌──────────────┐ ┌──────────────────┐
//!   │   WidgetHost   │ │ LiveDisplay  │ │ CompanionChannel │
//!   │ reload timeline│ │ start / end  │ │  push summary    │
//!   └────────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! A failing sink never blocks the others and is never retried; the next
//! read of the store self-heals whatever display it left stale.

mod error;
mod mock;

pub use error::FanOutError;
pub use mock::{LiveDisplayCall, MockCompanionChannel, MockLiveDisplay, MockWidgetHost};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::control::{TimerChange, Transition};
use crate::types::CompanionMessage;

// ============================================================================
// Sink traits
// ============================================================================

/// Host of the home-screen widget.
#[allow(async_fn_in_trait)]
pub trait WidgetHost {
    /// Asks the host to recompute every widget timeline from the store.
    async fn reload_all_timelines(&self) -> Result<(), FanOutError>;
}

/// System-rendered countdown on the lock screen.
///
/// The live countdown has no paused visual; a paused timer is shown by not
/// having any live display at all.
#[allow(async_fn_in_trait)]
pub trait LiveDisplay {
    /// Starts a live countdown to `end_date`.
    async fn start(&self, end_date: DateTime<Utc>) -> Result<(), FanOutError>;

    /// Ends every live display, including ones started by other processes.
    async fn end_all(&self) -> Result<(), FanOutError>;

    /// Returns false when live displays are turned off.
    fn is_enabled(&self) -> bool;
}

/// Best-effort channel to a paired companion device.
#[allow(async_fn_in_trait)]
pub trait CompanionChannel {
    /// Pushes the latest summary. No acknowledgement, no retry.
    async fn push(&self, message: &CompanionMessage) -> Result<(), FanOutError>;
}

impl<T: WidgetHost> WidgetHost for std::sync::Arc<T> {
    async fn reload_all_timelines(&self) -> Result<(), FanOutError> {
        (**self).reload_all_timelines().await
    }
}

impl<T: LiveDisplay> LiveDisplay for std::sync::Arc<T> {
    async fn start(&self, end_date: DateTime<Utc>) -> Result<(), FanOutError> {
        (**self).start(end_date).await
    }

    async fn end_all(&self) -> Result<(), FanOutError> {
        (**self).end_all().await
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

impl<T: CompanionChannel> CompanionChannel for std::sync::Arc<T> {
    async fn push(&self, message: &CompanionMessage) -> Result<(), FanOutError> {
        (**self).push(message).await
    }
}

// ============================================================================
// Delivery report
// ============================================================================

/// Outcome of one sink for one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The side effect happened
    Delivered,
    /// Nothing to do for this sink (e.g. live displays disabled)
    Skipped,
    /// Silently dropped because nobody was listening
    Dropped,
    /// The sink reported an error
    Failed(FanOutError),
}

impl Delivery {
    fn from_result(result: Result<(), FanOutError>) -> Self {
        match result {
            Ok(()) => Delivery::Delivered,
            Err(e) if e.is_unreachable() => Delivery::Dropped,
            Err(e) => Delivery::Failed(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Delivery::Failed(_))
    }
}

/// Per-sink outcomes of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub widget: Delivery,
    pub live_display: Delivery,
    pub companion: Delivery,
}

// ============================================================================
// FanOut
// ============================================================================

/// Dispatches timer changes to the widget, live display and companion.
pub struct FanOut<W, L, C> {
    widget: W,
    live_display: L,
    companion: C,
}

impl<W: WidgetHost, L: LiveDisplay, C: CompanionChannel> FanOut<W, L, C> {
    pub fn new(widget: W, live_display: L, companion: C) -> Self {
        Self {
            widget,
            live_display,
            companion,
        }
    }

    /// Runs the three side effects for `change` concurrently.
    pub async fn dispatch(&self, change: &TimerChange) -> FanOutReport {
        let message = CompanionMessage::from_record(&change.record);

        let (widget, live_display, companion) = tokio::join!(
            self.widget.reload_all_timelines(),
            self.update_live_display(change),
            self.companion.push(&message),
        );

        let report = FanOutReport {
            widget: Delivery::from_result(widget),
            live_display,
            companion: Delivery::from_result(companion),
        };
        log_report(&report);
        report
    }

    /// Dispatches every change until all senders are dropped.
    pub async fn run(self, mut change_rx: mpsc::UnboundedReceiver<TimerChange>) {
        while let Some(change) = change_rx.recv().await {
            tracing::debug!(transition = ?change.transition, "変更を配信します");
            self.dispatch(&change).await;
        }
        tracing::debug!("変更チャネルが閉じられました");
    }

    async fn update_live_display(&self, change: &TimerChange) -> Delivery {
        match (change.transition, change.record.end_date) {
            (Transition::Started { .. }, Some(end_date)) => {
                if !self.live_display.is_enabled() {
                    return Delivery::Skipped;
                }
                // Tear down the previous run's display before issuing a new one.
                if let Err(e) = self.live_display.end_all().await {
                    tracing::warn!("既存のライブアクティビティを終了できません: {}", e);
                }
                Delivery::from_result(self.live_display.start(end_date).await)
            }
            (Transition::Started { .. }, None) => Delivery::Skipped,
            (Transition::Paused | Transition::Stopped, _) => {
                Delivery::from_result(self.live_display.end_all().await)
            }
        }
    }
}

fn log_report(report: &FanOutReport) {
    for (sink, delivery) in [
        ("widget", &report.widget),
        ("live_display", &report.live_display),
        ("companion", &report.companion),
    ] {
        match delivery {
            Delivery::Failed(e) => tracing::warn!(sink, "{}", e),
            Delivery::Dropped => tracing::debug!(sink, "受信者がいないため破棄しました"),
            Delivery::Delivered | Delivery::Skipped => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TimerRecord, TimerState};
    use chrono::TimeZone;

    fn end_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 9, 25, 0).unwrap()
    }

    fn started(resumed: bool) -> TimerChange {
        TimerChange {
            transition: Transition::Started { resumed },
            record: TimerRecord {
                state: TimerState::Running,
                end_date: Some(end_date()),
                original_duration: Some(1500.0),
                remaining_duration: None,
                last_configured_duration: Some(1500.0),
            },
        }
    }

    fn paused() -> TimerChange {
        TimerChange {
            transition: Transition::Paused,
            record: TimerRecord {
                state: TimerState::Paused,
                original_duration: Some(1500.0),
                remaining_duration: Some(1490.0),
                last_configured_duration: Some(1500.0),
                ..TimerRecord::idle()
            },
        }
    }

    fn stopped() -> TimerChange {
        TimerChange {
            transition: Transition::Stopped,
            record: TimerRecord::idle(),
        }
    }

    fn create_fanout() -> FanOut<MockWidgetHost, MockLiveDisplay, MockCompanionChannel> {
        FanOut::new(
            MockWidgetHost::new(),
            MockLiveDisplay::new(),
            MockCompanionChannel::new(),
        )
    }

    mod dispatch_tests {
        use super::*;

        #[tokio::test]
        async fn test_start_reissues_live_display() {
            let fanout = create_fanout();

            let report = fanout.dispatch(&started(false)).await;

            assert_eq!(report.widget, Delivery::Delivered);
            assert_eq!(report.live_display, Delivery::Delivered);
            assert_eq!(report.companion, Delivery::Delivered);
            assert_eq!(fanout.widget.reload_count(), 1);
            assert_eq!(
                fanout.live_display.calls(),
                vec![LiveDisplayCall::EndAll, LiveDisplayCall::Start(end_date())]
            );
        }

        #[tokio::test]
        async fn test_pause_and_stop_tear_down_live_display() {
            let fanout = create_fanout();

            fanout.dispatch(&paused()).await;
            fanout.dispatch(&stopped()).await;

            assert_eq!(
                fanout.live_display.calls(),
                vec![LiveDisplayCall::EndAll, LiveDisplayCall::EndAll]
            );
            assert_eq!(fanout.widget.reload_count(), 2);
        }

        #[tokio::test]
        async fn test_companion_receives_summary() {
            let fanout = create_fanout();

            fanout.dispatch(&paused()).await;

            let messages = fanout.companion.messages();
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].state, TimerState::Paused);
            assert_eq!(messages[0].remaining, Some(1490.0));
            assert_eq!(messages[0].end_date, None);
        }

        #[tokio::test]
        async fn test_disabled_live_display_is_skipped() {
            let fanout = create_fanout();
            fanout.live_display.set_enabled(false);

            let report = fanout.dispatch(&started(true)).await;

            assert_eq!(report.live_display, Delivery::Skipped);
            assert!(fanout.live_display.calls().is_empty());
        }

        #[tokio::test]
        async fn test_unreachable_companion_is_dropped() {
            let fanout = create_fanout();
            fanout.companion.set_reachable(false);

            let report = fanout.dispatch(&started(false)).await;

            assert_eq!(report.companion, Delivery::Dropped);
            assert!(!report.companion.is_failed());
            assert!(fanout.companion.messages().is_empty());
        }
    }

    mod isolation_tests {
        use super::*;

        #[tokio::test]
        async fn test_widget_failure_does_not_block_others() {
            let fanout = create_fanout();
            fanout.widget.set_should_fail(true);

            let report = fanout.dispatch(&started(false)).await;

            assert!(report.widget.is_failed());
            assert_eq!(report.live_display, Delivery::Delivered);
            assert_eq!(report.companion, Delivery::Delivered);
        }

        #[tokio::test]
        async fn test_failed_teardown_still_starts_new_display() {
            let fanout = create_fanout();
            fanout.live_display.set_should_fail_end(true);

            let report = fanout.dispatch(&started(false)).await;

            assert_eq!(report.live_display, Delivery::Delivered);
            assert_eq!(
                fanout.live_display.calls(),
                vec![LiveDisplayCall::Start(end_date())]
            );
        }

        #[tokio::test]
        async fn test_live_display_failure_reported() {
            let fanout = create_fanout();
            fanout.live_display.set_should_fail_start(true);

            let report = fanout.dispatch(&started(false)).await;

            assert!(report.live_display.is_failed());
            assert_eq!(report.widget, Delivery::Delivered);
            assert_eq!(report.companion, Delivery::Delivered);
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_run_drains_until_senders_drop() {
            let (tx, rx) = mpsc::unbounded_channel();
            tx.send(started(false)).unwrap();
            tx.send(paused()).unwrap();
            tx.send(stopped()).unwrap();
            drop(tx);

            let widget = std::sync::Arc::new(MockWidgetHost::new());
            let fanout = FanOut::new(
                widget.clone(),
                MockLiveDisplay::new(),
                MockCompanionChannel::new(),
            );
            fanout.run(rx).await;

            assert_eq!(widget.reload_count(), 3);
        }
    }
}
