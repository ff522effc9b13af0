//! In-memory storage for dry runs and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::BoardCursor;
use crate::storage::{CursorStore, LedgerStore};

/// Volatile storage backend holding cursors and ledger titles in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    boards: Mutex<Vec<BoardCursor>>,
    titles: Mutex<Vec<String>>,
    advance_calls: Mutex<Vec<(String, u64)>>,
}

impl MemoryStorage {
    pub fn new(boards: Vec<BoardCursor>) -> Self {
        Self {
            boards: Mutex::new(boards),
            ..Self::default()
        }
    }

    /// Every `advance` call received, including no-ops.
    pub fn advance_calls(&self) -> Vec<(String, u64)> {
        self.advance_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn saved_titles(&self) -> Vec<String> {
        self.titles.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CursorStore for MemoryStorage {
    async fn get_all(&self) -> Result<Vec<BoardCursor>> {
        Ok(self.boards.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn advance(&self, page_url: &str, new_number: u64) -> Result<bool> {
        self.advance_calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((page_url.to_string(), new_number));

        let mut boards = self.boards.lock().unwrap_or_else(|e| e.into_inner());
        let cursor = boards
            .iter_mut()
            .find(|b| b.page_url == page_url)
            .ok_or_else(|| AppError::persistence("memory", format!("no cursor for {page_url}")))?;

        if new_number <= cursor.last_seen_number {
            return Ok(false);
        }
        cursor.last_seen_number = new_number;
        Ok(true)
    }
}

#[async_trait]
impl LedgerStore for MemoryStorage {
    async fn load_titles(&self) -> Result<Vec<String>> {
        Ok(self.saved_titles())
    }

    async fn save_titles(&self, titles: &[String]) -> Result<()> {
        *self.titles.lock().unwrap_or_else(|e| e.into_inner()) = titles.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_advance_forward_only() {
        let storage = MemoryStorage::new(vec![BoardCursor::new("p", "d", 10)]);

        assert!(storage.advance("p", 12).await.unwrap());
        assert!(!storage.advance("p", 12).await.unwrap());
        assert!(!storage.advance("p", 3).await.unwrap());
        assert_eq!(storage.get_all().await.unwrap()[0].last_seen_number, 12);
        assert_eq!(storage.advance_calls().len(), 3);
    }
}
