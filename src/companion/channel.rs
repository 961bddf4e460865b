//! Sending side of the companion link.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::net::UnixDatagram;
use tokio::time::{timeout, Duration};

use super::MAX_MESSAGE_SIZE;
use crate::fanout::{CompanionChannel, FanOutError};
use crate::types::CompanionMessage;

/// Send timeout in milliseconds
const SEND_TIMEOUT_MS: u64 = 500;

/// Pushes summaries to a companion listening on a Unix datagram socket.
#[derive(Debug, Clone)]
pub struct UnixCompanionChannel {
    socket_path: PathBuf,
}

impl UnixCompanionChannel {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl CompanionChannel for UnixCompanionChannel {
    async fn push(&self, message: &CompanionMessage) -> Result<(), FanOutError> {
        if !self.socket_path.exists() {
            return Err(FanOutError::CompanionUnreachable);
        }

        let json = serde_json::to_vec(message).map_err(|e| FanOutError::Companion(e.to_string()))?;
        if json.len() > MAX_MESSAGE_SIZE {
            return Err(FanOutError::Companion(format!(
                "メッセージが大きすぎます（{} バイト）",
                json.len()
            )));
        }

        let socket = UnixDatagram::unbound().map_err(|e| FanOutError::Companion(e.to_string()))?;

        let send = timeout(
            Duration::from_millis(SEND_TIMEOUT_MS),
            socket.send_to(&json, &self.socket_path),
        )
        .await;

        match send {
            Ok(Ok(_)) => {
                tracing::debug!(state = %message.state, "コンパニオンへ送信しました");
                Ok(())
            }
            // Stale socket file with nobody bound to it
            Ok(Err(e))
                if matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::NotFound) =>
            {
                Err(FanOutError::CompanionUnreachable)
            }
            Ok(Err(e)) => Err(FanOutError::Companion(e.to_string())),
            Err(_) => Err(FanOutError::Companion("送信がタイムアウトしました".to_string())),
        }
    }
}
