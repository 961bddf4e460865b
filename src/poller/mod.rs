//! Foreground refresh loop.
//!
//! A foreground UI showing a countdown re-reads the store on a short
//! interval instead of listening for changes. Each poll derives the display
//! state and compares it with the cached one, which surfaces both external
//! writes (a widget button, another process) and natural expiry.
//!
//! Expiry is only reported, never written back; the record keeps saying
//! Running until someone starts or stops a timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::clock::Clock;
use crate::derive::derive;
use crate::store::TimerStore;
use crate::types::{DerivedState, TimerState};

/// Default polling interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Same display state; remaining time refreshed
    Tick(DerivedState),
    /// Display state changed (external write)
    Changed(DerivedState),
    /// An active timer became idle (expired or stopped elsewhere)
    Finished,
    /// Idle before and after
    Idle,
}

/// Polls the store and tracks the last displayed state.
pub struct Poller<S, C> {
    store: S,
    clock: C,
    cached: DerivedState,
}

impl<S: TimerStore, C: Clock> Poller<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            cached: DerivedState::idle(),
        }
    }

    /// Seeds the cache from the store without reporting anything.
    ///
    /// Used when a UI comes to the foreground; a paused record restores its
    /// frozen remaining time here.
    pub fn restore(&mut self) -> DerivedState {
        self.cached = derive(&self.store.read(), self.clock.now());
        self.cached
    }

    pub fn cached(&self) -> DerivedState {
        self.cached
    }

    /// Re-reads the store once.
    pub fn poll(&mut self) -> PollOutcome {
        let derived = derive(&self.store.read(), self.clock.now());
        let previous = std::mem::replace(&mut self.cached, derived);

        match (previous.display_state, derived.display_state) {
            (TimerState::Idle, TimerState::Idle) => PollOutcome::Idle,
            (_, TimerState::Idle) => PollOutcome::Finished,
            (before, after) if before == after => PollOutcome::Tick(derived),
            _ => PollOutcome::Changed(derived),
        }
    }

    /// Polls every `period` and forwards outcomes until the timer finishes.
    ///
    /// Returns immediately after reporting [`PollOutcome::Idle`] when nothing
    /// is active, and stops early if the receiver is dropped.
    pub async fn run(mut self, period: Duration, tx: mpsc::UnboundedSender<PollOutcome>) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let outcome = self.poll();
            let done = matches!(outcome, PollOutcome::Finished | PollOutcome::Idle);

            if tx.send(outcome).is_err() {
                tracing::debug!("ポーリングの受信者がいません");
                return;
            }
            if done {
                tracing::debug!(?outcome, "ポーリングを終了します");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use crate::clock::{add_seconds, ManualClock};
    use crate::store::MemoryStore;
    use crate::types::TimerRecord;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap()
    }

    fn running(duration: f64) -> TimerRecord {
        TimerRecord {
            state: TimerState::Running,
            end_date: Some(add_seconds(t0(), duration)),
            original_duration: Some(duration),
            remaining_duration: None,
            last_configured_duration: Some(duration),
        }
    }

    fn create_poller(
        record: TimerRecord,
    ) -> (
        Poller<Arc<MemoryStore>, Arc<ManualClock>>,
        Arc<MemoryStore>,
        Arc<ManualClock>,
    ) {
        let store = Arc::new(MemoryStore::with_record(record));
        let clock = Arc::new(ManualClock::new(t0()));
        (Poller::new(store.clone(), clock.clone()), store, clock)
    }

    mod poll_tests {
        use super::*;

        #[test]
        fn test_restore_paused_keeps_frozen_time() {
            let record = TimerRecord {
                state: TimerState::Paused,
                original_duration: Some(1500.0),
                remaining_duration: Some(1490.0),
                ..TimerRecord::idle()
            };
            let (mut poller, _, clock) = create_poller(record);

            let restored = poller.restore();
            assert_eq!(restored.display_state, TimerState::Paused);
            assert_eq!(restored.remaining_seconds, 1490.0);

            clock.advance_secs(600.0);
            match poller.poll() {
                PollOutcome::Tick(derived) => assert_eq!(derived.remaining_seconds, 1490.0),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }

        #[test]
        fn test_running_ticks_then_finishes() {
            let (mut poller, store, clock) = create_poller(running(1.0));
            poller.restore();

            clock.advance_secs(0.5);
            assert_eq!(
                poller.poll(),
                PollOutcome::Tick(DerivedState {
                    display_state: TimerState::Running,
                    remaining_seconds: 0.5,
                })
            );

            clock.advance_secs(0.5);
            assert_eq!(poller.poll(), PollOutcome::Finished);
            assert_eq!(poller.poll(), PollOutcome::Idle);

            // Expiry is never written back.
            assert_eq!(store.read().state, TimerState::Running);
            assert_eq!(store.write_count(), 0);
        }

        #[test]
        fn test_external_pause_is_a_change() {
            let (mut poller, store, clock) = create_poller(running(1500.0));
            poller.restore();

            clock.advance_secs(10.0);
            store.replace(TimerRecord {
                state: TimerState::Paused,
                original_duration: Some(1500.0),
                remaining_duration: Some(1490.0),
                last_configured_duration: Some(1500.0),
                ..TimerRecord::idle()
            });

            assert_eq!(
                poller.poll(),
                PollOutcome::Changed(DerivedState {
                    display_state: TimerState::Paused,
                    remaining_seconds: 1490.0,
                })
            );
        }

        #[test]
        fn test_external_stop_finishes() {
            let (mut poller, store, _) = create_poller(running(1500.0));
            poller.restore();

            store.replace(TimerRecord::idle());

            assert_eq!(poller.poll(), PollOutcome::Finished);
            assert_eq!(poller.cached(), DerivedState::idle());
        }

        #[test]
        fn test_external_start_from_idle_is_a_change() {
            let (mut poller, store, _) = create_poller(TimerRecord::idle());
            poller.restore();

            store.replace(running(300.0));

            assert!(matches!(poller.poll(), PollOutcome::Changed(_)));
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_run_stops_when_idle() {
            let (poller, _, _) = create_poller(TimerRecord::idle());
            let (tx, mut rx) = mpsc::unbounded_channel();

            poller.run(Duration::from_millis(1), tx).await;

            assert_eq!(rx.recv().await, Some(PollOutcome::Idle));
            assert_eq!(rx.recv().await, None);
        }

        #[tokio::test]
        async fn test_run_reports_finish_after_expiry() {
            let (mut poller, _, clock) = create_poller(running(1500.0));
            poller.restore();
            clock.advance_secs(1500.0);
            let (tx, mut rx) = mpsc::unbounded_channel();

            poller.run(Duration::from_millis(1), tx).await;

            assert_eq!(rx.recv().await, Some(PollOutcome::Finished));
            assert_eq!(rx.recv().await, None);
        }

        #[tokio::test]
        async fn test_run_stops_when_receiver_dropped() {
            let (mut poller, _, _) = create_poller(running(1500.0));
            poller.restore();
            let (tx, rx) = mpsc::unbounded_channel();
            drop(rx);

            poller.run(Duration::from_millis(1), tx).await;
        }
    }
}
