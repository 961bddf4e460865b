//! Receiving side of the companion link.

use std::path::{Path, PathBuf};

use tokio::net::UnixDatagram;
use tokio::time::{timeout, Duration};

use super::{ChannelError, MAX_MESSAGE_SIZE};
use crate::types::CompanionMessage;

/// Unix datagram socket a companion listens on.
pub struct CompanionListener {
    socket: UnixDatagram,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl CompanionListener {
    /// Binds a listener at `socket_path`.
    ///
    /// A leftover socket file from an earlier listener is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn bind(socket_path: &Path) -> Result<Self, ChannelError> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .map_err(|e| ChannelError::Bind(format!("{}: {}", socket_path.display(), e)))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChannelError::Bind(format!("{}: {}", parent.display(), e)))?;
        }

        let socket = UnixDatagram::bind(socket_path)
            .map_err(|e| ChannelError::Bind(format!("{}: {}", socket_path.display(), e)))?;

        Ok(Self {
            socket,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Waits for the next message.
    ///
    /// # Errors
    ///
    /// Returns an error if receiving fails or the datagram is not a valid
    /// message.
    pub async fn receive(&self) -> Result<CompanionMessage, ChannelError> {
        // One extra byte detects oversized datagrams, which are truncated.
        let mut buffer = vec![0u8; MAX_MESSAGE_SIZE + 1];

        let n = self
            .socket
            .recv(&mut buffer)
            .await
            .map_err(|e| ChannelError::Receive(e.to_string()))?;

        if n > MAX_MESSAGE_SIZE {
            return Err(ChannelError::TooLarge);
        }

        Ok(serde_json::from_slice(&buffer[..n])?)
    }

    /// Like [`receive`](Self::receive) with a deadline.
    pub async fn receive_timeout(&self, limit: Duration) -> Result<CompanionMessage, ChannelError> {
        timeout(limit, self.receive())
            .await
            .map_err(|_| ChannelError::Timeout)?
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for CompanionListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
