//! Pomodoro Cube Library
//!
//! Keeps one focus timer consistent across every surface that shows it:
//! the foreground app, the home-screen widget, the lock-screen live
//! activity, background actions and a paired companion device.
//!
//! It includes:
//! - The persisted timer record and the pure derivation every renderer uses
//! - A shared file store with atomic whole-record writes
//! - The timer controller and the notification fan-out
//! - Widget timeline, live activity and companion sinks
//! - A foreground poller, background actions and the CLI

pub mod cli;
pub mod clock;
pub mod companion;
pub mod config;
pub mod control;
pub mod derive;
pub mod faces;
pub mod fanout;
pub mod intents;
pub mod live;
pub mod poller;
pub mod store;
pub mod types;
pub mod widget;

// Re-export commonly used types for convenience
pub use types::{CompanionMessage, DerivedState, TimerRecord, TimerState};

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AppGroup, ConfigError, CubeSettings, SyncConfig};
pub use control::{TimerChange, TimerController, Transition};
pub use crate::derive::derive;
pub use faces::{CubeFace, CubeMode, FaceCatalog};
pub use intents::Intent;
pub use poller::{PollOutcome, Poller};
pub use store::{FileStore, MemoryStore, StoreError, TimerStore};

// Re-export fan-out types
pub use fanout::{
    CompanionChannel, Delivery, FanOut, FanOutError, FanOutReport, LiveDisplay,
    MockCompanionChannel, MockLiveDisplay, MockWidgetHost, WidgetHost,
};

// Re-export sink types
pub use companion::{
    ChannelError, CompanionEvent, CompanionListener, CompanionSession, UnixCompanionChannel,
    WatchModel,
};
pub use live::{LiveActivity, LiveActivityManager};
pub use widget::{Timeline, TimelineEntry, TimelineFileHost};
