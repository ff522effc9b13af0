//! Service layer for the relay.
//!
//! This module contains the business logic for:
//! - New-row discovery on board listings (`AnnouncementDiscovery`)
//! - Detail page retrieval (`AnnouncementFetcher`)
//! - Recent-title duplicate suppression (`DuplicateDetector`)
//! - Keyword and oracle classification (`Classifier`)
//! - Posting to the course portal (`publisher`)

mod classifier;
mod dedup;
mod discovery;
mod fetcher;
pub mod oracle;
pub mod publisher;

use async_trait::async_trait;
use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::{Announcement, BoardCursor};

pub use classifier::Classifier;
pub use dedup::DuplicateDetector;
pub use discovery::{AnnouncementDiscovery, Discovery, ListingSelectors};
pub use fetcher::{AnnouncementFetcher, AttachmentLink, DetailSelectors};
pub use oracle::{CategoryOracle, OpenAiOracle};
pub use publisher::{Publisher, PublishingSession};

/// Finds announcements added to a board since its cursor.
#[async_trait]
pub trait BoardScanner: Send + Sync {
    /// Never fails: an unreadable listing yields an empty discovery whose
    /// latest number equals the cursor.
    async fn discover(&self, cursor: &BoardCursor) -> Discovery;
}

/// Reads announcement detail pages.
#[async_trait]
pub trait AnnouncementSource: Send + Sync {
    /// Title and plain text only. `None` on any fetch or parse failure.
    async fn fetch_partial(&self, url: &str) -> Option<Announcement>;

    /// Rewritten HTML and downloaded attachments. `None` when the page or its
    /// body container is unavailable.
    async fn fetch_full(&self, url: &str) -> Option<Announcement>;

    /// Drop whatever `fetch_full` staged on disk for `announcement`.
    async fn release(&self, _announcement: &Announcement) {}
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
