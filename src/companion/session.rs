//! Companion runtime: the listener and the local countdown in one loop.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::{CompanionListener, WatchModel, WatchTick};
use crate::clock::Clock;
use crate::types::{CompanionMessage, DerivedState};

/// Period of the companion's own countdown.
pub const WATCH_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Something the companion should render.
#[derive(Debug, Clone, PartialEq)]
pub enum CompanionEvent {
    /// A phone summary arrived, with how it renders right now
    Phone {
        message: CompanionMessage,
        view: DerivedState,
    },
    /// The local countdown advanced or completed
    Tick(WatchTick),
}

/// Drives a [`WatchModel`] from its ticker and from incoming phone messages.
pub struct CompanionSession<C> {
    listener: CompanionListener,
    model: WatchModel,
    clock: C,
    tick_period: Duration,
    exit_on_finish: bool,
}

impl<C: Clock> CompanionSession<C> {
    pub fn new(listener: CompanionListener, model: WatchModel, clock: C) -> Self {
        Self {
            listener,
            model,
            clock,
            tick_period: WATCH_TICK_PERIOD,
            exit_on_finish: false,
        }
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Stops the loop once the local countdown completes.
    #[must_use]
    pub fn with_exit_on_finish(mut self, exit: bool) -> Self {
        self.exit_on_finish = exit;
        self
    }

    pub fn model(&self) -> &WatchModel {
        &self.model
    }

    /// Forwards events until the receiver is dropped, or until the countdown
    /// completes when exit-on-finish is set. Returns the final model.
    pub async fn run(mut self, tx: mpsc::UnboundedSender<CompanionEvent>) -> WatchModel {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick is immediate; a full period must pass before the
        // countdown moves.
        ticker.tick().await;

        loop {
            let event = tokio::select! {
                received = self.listener.receive() => match received {
                    Ok(message) => {
                        self.model.apply_phone_context(message.clone());
                        match self.model.phone_view(self.clock.now()) {
                            Some(view) => CompanionEvent::Phone { message, view },
                            None => continue,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        continue;
                    }
                },
                _ = ticker.tick() => match self.model.tick() {
                    WatchTick::Idle => continue,
                    tick => CompanionEvent::Tick(tick),
                },
            };

            let finished = event == CompanionEvent::Tick(WatchTick::Completed);
            if tx.send(event).is_err() {
                tracing::debug!("コンパニオンの受信者がいません");
                break;
            }
            if finished && self.exit_on_finish {
                tracing::debug!("カウントダウンが終了したため待ち受けを終了します");
                break;
            }
        }

        self.model
    }
}
