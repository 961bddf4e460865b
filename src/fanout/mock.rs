//! Recording sinks for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{CompanionChannel, FanOutError, LiveDisplay, WidgetHost};
use crate::types::CompanionMessage;

/// Widget host that counts reload requests.
#[derive(Debug, Default)]
pub struct MockWidgetHost {
    reloads: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockWidgetHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl WidgetHost for MockWidgetHost {
    async fn reload_all_timelines(&self) -> Result<(), FanOutError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(FanOutError::Widget("simulated failure".to_string()));
        }
        self.reloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A call made on [`MockLiveDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveDisplayCall {
    Start(DateTime<Utc>),
    EndAll,
}

/// Live display that records successful calls.
#[derive(Debug)]
pub struct MockLiveDisplay {
    calls: Mutex<Vec<LiveDisplayCall>>,
    enabled: AtomicBool,
    should_fail_start: AtomicBool,
    should_fail_end: AtomicBool,
}

impl Default for MockLiveDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLiveDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            enabled: AtomicBool::new(true),
            should_fail_start: AtomicBool::new(false),
            should_fail_end: AtomicBool::new(false),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_should_fail_start(&self, should_fail: bool) {
        self.should_fail_start.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_end(&self, should_fail: bool) {
        self.should_fail_end.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<LiveDisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// End instant of the display that would currently be visible.
    #[must_use]
    pub fn active_end_date(&self) -> Option<DateTime<Utc>> {
        match self.calls.lock().unwrap().last() {
            Some(LiveDisplayCall::Start(end_date)) => Some(*end_date),
            _ => None,
        }
    }
}

impl LiveDisplay for MockLiveDisplay {
    async fn start(&self, end_date: DateTime<Utc>) -> Result<(), FanOutError> {
        if self.should_fail_start.load(Ordering::SeqCst) {
            return Err(FanOutError::LiveDisplay("simulated failure".to_string()));
        }
        self.calls.lock().unwrap().push(LiveDisplayCall::Start(end_date));
        Ok(())
    }

    async fn end_all(&self) -> Result<(), FanOutError> {
        if self.should_fail_end.load(Ordering::SeqCst) {
            return Err(FanOutError::LiveDisplay("simulated failure".to_string()));
        }
        self.calls.lock().unwrap().push(LiveDisplayCall::EndAll);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Companion channel that keeps every pushed message.
#[derive(Debug)]
pub struct MockCompanionChannel {
    messages: Mutex<Vec<CompanionMessage>>,
    reachable: AtomicBool,
}

impl Default for MockCompanionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompanionChannel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    #[must_use]
    pub fn messages(&self) -> Vec<CompanionMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl CompanionChannel for MockCompanionChannel {
    async fn push(&self, message: &CompanionMessage) -> Result<(), FanOutError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(FanOutError::CompanionUnreachable);
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
