//! Timer control for the Pomodoro Cube.
//!
//! This module contains the only code allowed to mutate the shared record:
//! - `controller`: start / pause / resume / stop as whole-record writes
//! - `TimerChange`: the event emitted after each durable write, consumed by
//!   the fan-out dispatcher

pub mod controller;

pub use controller::{TimerController, DEFAULT_DURATION_SECS, MAX_DURATION_SECS};

use crate::types::TimerRecord;

/// Kind of transition that produced a [`TimerChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Timer entered Running
    Started {
        /// True when continuing from a pause rather than a fresh start
        resumed: bool,
    },
    /// Timer entered Paused
    Paused,
    /// Timer entered Idle
    Stopped,
}

impl Transition {
    /// Returns true if the timer is Running after this transition.
    pub fn enters_running(&self) -> bool {
        matches!(self, Transition::Started { .. })
    }
}

/// A durable mutation of the shared record.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerChange {
    /// What happened
    pub transition: Transition,
    /// The record as written to the store
    pub record: TimerRecord,
}
