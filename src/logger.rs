use crate::device::DeviceRecord;
use crate::error::{LogError, LogResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only device log backed by a single text file.
///
/// Every file operation runs while holding `lock`, so reads, appends and
/// truncations never interleave.
pub struct DeviceLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DeviceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole log. Returns `None` when the file is absent or empty.
    pub async fn read(&self) -> LogResult<Option<Vec<u8>>> {
        let _guard = self.lock.lock().await;

        match tokio::fs::read(&self.path).await {
            Ok(content) if content.is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LogError::Read(e)),
        }
    }

    pub async fn append(&self, record: &DeviceRecord) -> LogResult<()> {
        let line = record.to_log_line();

        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(LogError::Open)?;

        file.write_all(line.as_bytes()).await.map_err(LogError::Write)?;
        file.flush().await.map_err(LogError::Write)?;
        Ok(())
    }

    /// Truncate the log to zero length. Clearing a log that does not exist
    /// succeeds without creating it.
    pub async fn clear(&self) -> LogResult<()> {
        let _guard = self.lock.lock().await;

        let file = match OpenOptions::new().write(true).open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(LogError::Truncate(e)),
        };

        file.set_len(0).await.map_err(LogError::Truncate)
    }
}
