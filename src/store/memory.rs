//! In-memory timer store for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{StoreError, TimerStore};
use crate::types::TimerRecord;

/// Timer store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<TimerRecord>,
    writes: AtomicUsize,
    should_fail_write: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `record`.
    #[must_use]
    pub fn with_record(record: TimerRecord) -> Self {
        Self {
            record: Mutex::new(record),
            ..Self::default()
        }
    }

    /// Makes subsequent writes fail without changing the record.
    pub fn set_should_fail_write(&self, should_fail: bool) {
        self.should_fail_write.store(should_fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Overwrites the record without counting a write, as another process would.
    pub fn replace(&self, record: TimerRecord) {
        *self.lock() = record;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimerRecord> {
        self.record.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TimerStore for MemoryStore {
    fn read(&self) -> TimerRecord {
        self.lock().clone()
    }

    fn write(&self, record: &TimerRecord) -> Result<(), StoreError> {
        if self.should_fail_write.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        *self.lock() = record.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
