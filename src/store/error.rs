//! Timer store error types.
//!
//! Readers never see these: a store that cannot be read degrades to the
//! Idle record. Only writes report failures, and the control API logs them
//! instead of surfacing them to a UI.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while persisting the timer record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The shared storage medium could not be accessed.
    #[error("共有ストレージにアクセスできません ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The record could not be encoded.
    #[error("タイマー状態のシリアライズに失敗しました: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The namespace cannot be used as a directory name.
    #[error("無効なネームスペース: '{0}'")]
    InvalidNamespace(String),

    /// Simulated failure from a test store.
    #[error("ストレージが利用できません")]
    Unavailable,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
