//! File-backed timer store.
//!
//! The record lives at `<root>/<namespace>/timer.json`. Writes go to a
//! uniquely named sibling file which is flushed and then renamed over the
//! record, so a reader in another process sees either the old or the new
//! record, never a torn one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{StoreError, TimerStore};
use crate::types::TimerRecord;

/// File name of the record inside the namespace directory.
pub const RECORD_FILE_NAME: &str = "timer.json";

/// Timer store shared through the filesystem.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Full path of the record file
    path: PathBuf,
}

impl FileStore {
    /// Opens the store for `namespace` under `root`.
    ///
    /// Nothing is created until the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is empty or contains path
    /// separators.
    pub fn open(root: &Path, namespace: &str) -> Result<Self, StoreError> {
        if namespace.is_empty()
            || namespace == "."
            || namespace == ".."
            || namespace.contains(['/', '\\'])
        {
            return Err(StoreError::InvalidNamespace(namespace.to_string()));
        }

        Ok(Self {
            path: root.join(namespace).join(RECORD_FILE_NAME),
        })
    }

    /// Returns the record file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the namespace directory holding the record.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    fn try_read(&self) -> Result<Option<TimerRecord>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

impl TimerStore for FileStore {
    fn read(&self) -> TimerRecord {
        match self.try_read() {
            Ok(Some(record)) => record,
            Ok(None) => TimerRecord::idle(),
            Err(e) => {
                tracing::warn!("タイマー状態を読み込めません。停止状態として扱います: {}", e);
                TimerRecord::idle()
            }
        }
    }

    fn write(&self, record: &TimerRecord) -> Result<(), StoreError> {
        let dir = self.dir().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let json = serde_json::to_vec_pretty(record)?;

        let tmp_path = dir.join(format!(".{}.{}.tmp", RECORD_FILE_NAME, uuid::Uuid::new_v4()));
        let result = (|| {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path);
            return Err(StoreError::io(&self.path, e));
        }

        tracing::debug!(state = %record.state, path = ?self.path, "タイマー状態を保存しました");
        Ok(())
    }
}
