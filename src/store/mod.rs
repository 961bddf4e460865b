//! Durable storage for the shared timer record.
//!
//! Every cooperating process on a device (foreground app, widget renderer,
//! live display, background actions) reads and writes the same record
//! through a [`TimerStore`]. The record is always replaced whole; there is
//! no versioning, so the last writer wins.
//!
//! # Implementations
//!
//! - [`FileStore`]: a JSON key-value file under a fixed namespace directory,
//!   replaced atomically on every write
//! - [`MemoryStore`]: in-process store for tests

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::{FileStore, RECORD_FILE_NAME};
pub use memory::MemoryStore;

use crate::types::TimerRecord;

/// Read/write port for the single timer record.
pub trait TimerStore {
    /// Reads the current record.
    ///
    /// Never fails: unavailable or unreadable storage yields the Idle
    /// default so a renderer always has something to show.
    fn read(&self) -> TimerRecord;

    /// Replaces the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be made durable.
    fn write(&self, record: &TimerRecord) -> Result<(), StoreError>;
}

impl<S: TimerStore + ?Sized> TimerStore for std::sync::Arc<S> {
    fn read(&self) -> TimerRecord {
        (**self).read()
    }

    fn write(&self, record: &TimerRecord) -> Result<(), StoreError> {
        (**self).write(record)
    }
}

impl<S: TimerStore + ?Sized> TimerStore for &S {
    fn read(&self) -> TimerRecord {
        (**self).read()
    }

    fn write(&self, record: &TimerRecord) -> Result<(), StoreError> {
        (**self).write(record)
    }
}
