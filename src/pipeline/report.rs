//! Per-run audit report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Category;

/// What happened to one discovered announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnnouncementOutcome {
    Published {
        category: Category,
        attached: usize,
        abandoned: usize,
    },
    /// Title already in the recent-title ledger
    Duplicate,
    /// Matched an exclusion keyword
    Excluded,
    /// Classified as not applicable
    Rejected,
    /// Detail page unreadable
    FetchFailed,
    /// Classification or publishing failed
    Failed { reason: String },
}

impl AnnouncementOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::Duplicate => "duplicate",
            Self::Excluded => "excluded",
            Self::Rejected => "rejected",
            Self::FetchFailed => "fetch failed",
            Self::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementRecord {
    pub board: String,
    pub url: String,
    /// Falls back to the URL when the title could not be read
    pub title: String,
    pub outcome: AnnouncementOutcome,
}

/// Summary of one relay run, persisted as `last_run.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub boards_scanned: usize,
    pub cursor_advances: usize,
    /// Page URLs whose cursor could not be advanced
    pub cursor_failures: Vec<String>,
    pub announcements: Vec<AnnouncementRecord>,
    /// Set when a run-fatal error stopped the run early
    pub aborted: Option<String>,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            boards_scanned: 0,
            cursor_advances: 0,
            cursor_failures: Vec::new(),
            announcements: Vec::new(),
            aborted: None,
        }
    }

    pub fn record(
        &mut self,
        board: &str,
        url: &str,
        title: &str,
        outcome: AnnouncementOutcome,
    ) {
        log::info!("[{}] {}", outcome.label(), title);
        self.announcements.push(AnnouncementRecord {
            board: board.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            outcome,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of announcements whose outcome has the given label.
    pub fn count(&self, label: &str) -> usize {
        self.announcements
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }

    pub fn published(&self) -> usize {
        self.count("published")
    }

    pub fn log_summary(&self) {
        let elapsed = self
            .finished_at
            .map(|end| (end - self.started_at).num_seconds())
            .unwrap_or_default();
        log::info!(
            "Run finished in {}s: {} board(s), {} announcement(s), {} published, {} duplicate, \
             {} excluded, {} rejected, {} fetch failed, {} failed",
            elapsed,
            self.boards_scanned,
            self.announcements.len(),
            self.published(),
            self.count("duplicate"),
            self.count("excluded"),
            self.count("rejected"),
            self.count("fetch failed"),
            self.count("failed"),
        );
        log::info!(
            "Cursors advanced: {}, cursor failures: {}",
            self.cursor_advances,
            self.cursor_failures.len()
        );
        for url in &self.cursor_failures {
            log::warn!("  cursor not advanced: {}", url);
        }
        if let Some(reason) = &self.aborted {
            log::error!("Run aborted: {}", reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_outcome() {
        let mut report = RunReport::new(false);
        report.record("b", "u1", "t1", AnnouncementOutcome::Duplicate);
        report.record(
            "b",
            "u2",
            "t2",
            AnnouncementOutcome::Published {
                category: Category::Scholarship,
                attached: 2,
                abandoned: 0,
            },
        );
        report.record("b", "u3", "t3", AnnouncementOutcome::Duplicate);

        assert_eq!(report.published(), 1);
        assert_eq!(report.count("duplicate"), 2);
        assert_eq!(report.count("failed"), 0);
    }

    #[test]
    fn test_serializes_tagged_outcomes() {
        let mut report = RunReport::new(true);
        report.record(
            "b",
            "u",
            "t",
            AnnouncementOutcome::Failed {
                reason: "oracle unreachable".into(),
            },
        );
        report.finish();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["announcements"][0]["outcome"]["status"], "failed");
        assert_eq!(
            json["announcements"][0]["outcome"]["reason"],
            "oracle unreachable"
        );
        assert!(json["finished_at"].is_string());
    }
}
