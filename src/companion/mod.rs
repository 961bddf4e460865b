//! Best-effort link to a paired companion device.
//!
//! The phone side pushes a [`CompanionMessage`](crate::types::CompanionMessage)
//! after every mutation as a single Unix datagram. Nothing is queued: when
//! no companion is listening the message is dropped, and the companion
//! catches up on the next push.
//!
//! The companion runs its own timer model ([`WatchModel`]) with its own
//! presets. Phone messages are kept as context only and never drive the
//! companion's countdown. [`CompanionSession`] runs both in one loop.

mod channel;
mod listener;
mod session;
mod watch;

pub use channel::UnixCompanionChannel;
pub use listener::CompanionListener;
pub use session::{CompanionEvent, CompanionSession, WATCH_TICK_PERIOD};
pub use watch::{WatchModel, WatchTick};

/// Maximum encoded message size in bytes (4KB).
pub const MAX_MESSAGE_SIZE: usize = 4096;

/// File name of the companion socket inside the store root.
pub const SOCKET_FILE_NAME: &str = "companion.sock";

// ============================================================================
// ChannelError
// ============================================================================

/// Companion socket errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Socket binding error
    #[error("ソケットをバインドできません: {0}")]
    Bind(String),

    /// Receive error
    #[error("メッセージを受信できません: {0}")]
    Receive(String),

    /// Malformed message
    #[error("メッセージを解析できません: {0}")]
    Decode(#[from] serde_json::Error),

    /// Message exceeds the datagram limit
    #[error("メッセージが大きすぎます（最大 {MAX_MESSAGE_SIZE} バイト）")]
    TooLarge,

    /// No message before the deadline
    #[error("受信がタイムアウトしました")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(ChannelError::Timeout.to_string(), "受信がタイムアウトしました");
        assert!(ChannelError::TooLarge.to_string().contains("4096"));
        assert!(ChannelError::Bind("busy".into()).to_string().contains("busy"));
    }
}
