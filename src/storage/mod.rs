//! Storage abstractions for relay state.
//!
//! Two pieces of state survive between runs:
//! - Board cursors: the highest processed announcement number per board
//! - Recent titles: the bounded duplicate-suppression window
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Relay configuration
//! ├── boards.json           # Board cursors
//! ├── recent_titles.json    # Recent-title ledger, oldest first
//! ├── last_run.json         # Report of the previous run
//! └── downloads/            # Staged attachments
//!     └── {url-hash}/
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::BoardCursor;

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Durable per-board discovery cursors.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// All monitored boards in configured order.
    async fn get_all(&self) -> Result<Vec<BoardCursor>>;

    /// Move a board's cursor forward to `new_number`.
    ///
    /// Returns `Ok(false)` without writing when `new_number` is not greater
    /// than the stored value. Fails with `AppError::Persistence` when the
    /// update cannot be stored.
    async fn advance(&self, page_url: &str, new_number: u64) -> Result<bool>;
}

/// Durable copy of the recent-title ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Previously saved titles, oldest first.
    async fn load_titles(&self) -> Result<Vec<String>>;

    /// Replace the saved titles.
    async fn save_titles(&self, titles: &[String]) -> Result<()>;
}
