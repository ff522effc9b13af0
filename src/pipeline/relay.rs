// src/pipeline/relay.rs

//! Board-by-board relay loop.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{BoardCursor, Category};
use crate::pipeline::{AnnouncementOutcome, RunReport};
use crate::services::publisher::Publisher;
use crate::services::{AnnouncementSource, BoardScanner, Classifier, DuplicateDetector};
use crate::storage::{CursorStore, LedgerStore};

/// Collaborators for one run, all passed in explicitly.
pub struct Relay<'a> {
    pub cursors: &'a dyn CursorStore,
    pub ledger: &'a dyn LedgerStore,
    pub scanner: &'a dyn BoardScanner,
    pub source: &'a dyn AnnouncementSource,
    pub detector: &'a DuplicateDetector,
    pub classifier: &'a Classifier,
    pub publisher: &'a mut dyn Publisher,
    /// Pause after each announcement
    pub request_delay: Duration,
}

impl Relay<'_> {
    /// Process every board in cursor order.
    ///
    /// Per-announcement and per-board failures are recorded in `report`.
    /// Only run-fatal errors are returned, leaving the current board's
    /// cursor untouched.
    pub async fn run(&mut self, report: &mut RunReport) -> Result<()> {
        let boards = self.cursors.get_all().await?;
        log::info!("Relaying {} board(s)", boards.len());

        for cursor in &boards {
            report.boards_scanned += 1;
            self.process_board(cursor, report).await?;
        }
        Ok(())
    }

    async fn process_board(&mut self, cursor: &BoardCursor, report: &mut RunReport) -> Result<()> {
        let discovery = self.scanner.discover(cursor).await;
        if !discovery.urls.is_empty() {
            log::info!(
                "{}: {} new announcement(s)",
                cursor.page_url,
                discovery.urls.len()
            );
        }

        for url in &discovery.urls {
            let (title, outcome, fatal) = self.process_announcement(url).await;
            report.record(&cursor.page_url, url, &title, outcome);
            if let Some(e) = fatal {
                return Err(e);
            }

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        if discovery.latest_number > cursor.last_seen_number {
            match self
                .cursors
                .advance(&cursor.page_url, discovery.latest_number)
                .await
            {
                Ok(true) => {
                    report.cursor_advances += 1;
                    log::info!(
                        "{}: cursor {} -> {}",
                        cursor.page_url,
                        cursor.last_seen_number,
                        discovery.latest_number
                    );
                }
                Ok(false) => log::debug!("{}: cursor already current", cursor.page_url),
                Err(e) => {
                    log::error!("{}: failed to advance cursor: {}", cursor.page_url, e);
                    report.cursor_failures.push(cursor.page_url.clone());
                }
            }
        }
        Ok(())
    }

    /// Returns the announcement title (or URL), its outcome and, when the
    /// run must stop, the error that stopped it.
    async fn process_announcement(&mut self, url: &str) -> Step {
        let Some(partial) = self.source.fetch_partial(url).await else {
            return (url.to_string(), AnnouncementOutcome::FetchFailed, None);
        };
        let title = partial.title().to_string();

        if let Err(e) = self.detector.check(&title) {
            log::debug!("{}", e);
            return (title, AnnouncementOutcome::Duplicate, None);
        }

        let category = match self
            .classifier
            .classify(&title, partial.content_text())
            .await
        {
            Ok(category) => category,
            Err(e) if e.is_run_fatal() => {
                log::error!("Classifying '{}' failed fatally: {}", title, e);
                return (title, failed(&e), Some(e));
            }
            Err(e) => {
                log::warn!("Could not classify '{}': {}", title, e);
                return (title, failed(&e), None);
            }
        };
        log::info!("Classified '{}' as {}", title, category);

        match category {
            Category::Excluded => return (title, AnnouncementOutcome::Excluded, None),
            Category::NotApplicable => return (title, AnnouncementOutcome::Rejected, None),
            _ => {}
        }

        let Some(full) = self.source.fetch_full(url).await else {
            return (title, AnnouncementOutcome::FetchFailed, None);
        };
        let full = if full.title().is_empty() {
            full.with_title(title.as_str())
        } else {
            full
        };
        let full = full.with_category(category);

        let published = self.publisher.publish(&full).await;
        self.source.release(&full).await;

        match published {
            Ok(receipt) => {
                self.detector.record(&title);
                if let Err(e) = self.ledger.save_titles(&self.detector.titles()).await {
                    log::error!("Failed to persist recent titles: {}", e);
                }
                let outcome = AnnouncementOutcome::Published {
                    category,
                    attached: receipt.attachments.attached,
                    abandoned: receipt.attachments.abandoned,
                };
                (title, outcome, None)
            }
            Err(e) if e.is_run_fatal() => {
                log::error!("Publishing '{}' failed fatally: {}", title, e);
                (title, failed(&e), Some(e))
            }
            Err(e) => {
                log::warn!("Publishing '{}' failed: {}", title, e);
                (title, failed(&e), None)
            }
        }
    }
}

/// Title, outcome and an optional run-fatal error for one announcement.
type Step = (String, AnnouncementOutcome, Option<AppError>);

fn failed(error: &AppError) -> AnnouncementOutcome {
    AnnouncementOutcome::Failed {
        reason: error.to_string(),
    }
}
