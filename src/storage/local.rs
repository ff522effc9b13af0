//! Local filesystem storage implementation.
//!
//! Every file is written atomically (temp file, then rename) so an
//! interrupted run never leaves a truncated cursor file behind.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{BoardCursor, BoardList, StorageConfig};
use crate::pipeline::RunReport;
use crate::storage::{CursorStore, LedgerStore};

/// Local filesystem storage backend.
pub struct LocalStorage {
    root_dir: PathBuf,
    files: StorageConfig,
    /// Serializes read-modify-write cycles on the cursor file.
    cursor_lock: Mutex<()>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::with_files(root_dir, StorageConfig::default())
    }

    /// Create a LocalStorage with custom file names.
    pub fn with_files(root_dir: impl Into<PathBuf>, files: StorageConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            files,
            cursor_lock: Mutex::new(()),
        }
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn load_boards(&self) -> Result<BoardList> {
        Ok(self
            .read_json(&self.files.cursor_file)
            .await?
            .unwrap_or_default())
    }

    /// Replace the whole board list, e.g. when seeding a new storage directory.
    pub async fn save_boards(&self, boards: &[BoardCursor]) -> Result<()> {
        let list = BoardList {
            boards: boards.to_vec(),
        };
        self.write_json(&self.files.cursor_file, &list)
            .await
            .map_err(|e| AppError::persistence(&self.files.cursor_file, e))
    }

    /// Store the report of the latest run.
    pub async fn write_report(&self, report: &RunReport) -> Result<()> {
        self.write_json(&self.files.report_file, report).await
    }
}

#[async_trait]
impl CursorStore for LocalStorage {
    async fn get_all(&self) -> Result<Vec<BoardCursor>> {
        let list = self.load_boards().await?;
        if list.boards.is_empty() {
            log::warn!(
                "No boards configured in {}",
                self.path(&self.files.cursor_file).display()
            );
        }
        Ok(list.boards)
    }

    async fn advance(&self, page_url: &str, new_number: u64) -> Result<bool> {
        let _guard = self.cursor_lock.lock().await;
        let location = self.files.cursor_file.as_str();

        let mut list = self
            .load_boards()
            .await
            .map_err(|e| AppError::persistence(location, e))?;

        let cursor = list
            .boards
            .iter_mut()
            .find(|b| b.page_url == page_url)
            .ok_or_else(|| AppError::persistence(location, format!("no cursor for {page_url}")))?;

        if new_number <= cursor.last_seen_number {
            log::debug!(
                "Cursor for {} already at {} (asked {}), not moving",
                page_url,
                cursor.last_seen_number,
                new_number
            );
            return Ok(false);
        }

        let previous = cursor.last_seen_number;
        cursor.last_seen_number = new_number;

        self.write_json(location, &list)
            .await
            .map_err(|e| AppError::persistence(location, e))?;

        log::info!("Cursor for {} advanced {} → {}", page_url, previous, new_number);
        Ok(true)
    }
}

#[async_trait]
impl LedgerStore for LocalStorage {
    async fn load_titles(&self) -> Result<Vec<String>> {
        Ok(self
            .read_json(&self.files.ledger_file)
            .await?
            .unwrap_or_default())
    }

    async fn save_titles(&self, titles: &[String]) -> Result<()> {
        self.write_json(&self.files.ledger_file, titles)
            .await
            .map_err(|e| AppError::persistence(&self.files.ledger_file, e))
    }
}
