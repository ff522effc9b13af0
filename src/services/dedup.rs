//! Recent-title duplicate suppression.
//!
//! Sites occasionally re-list an announcement under a new number. A bounded
//! FIFO window of normalized titles, shared by all boards, catches those
//! re-listings without remembering titles forever.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::error::{AppError, Result};

/// Insertion-ordered, bounded set of normalized titles.
#[derive(Debug, Default)]
struct RecentTitleLedger {
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl RecentTitleLedger {
    fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    /// Returns false when the key is already present.
    fn insert(&mut self, key: String, capacity: usize) -> bool {
        if !self.members.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        while self.order.len() > capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }
        true
    }
}

/// Process-wide duplicate detector.
///
/// All access goes through one mutex, so a membership test and the matching
/// insert in [`DuplicateDetector::record`] happen atomically.
#[derive(Debug)]
pub struct DuplicateDetector {
    capacity: usize,
    ledger: Mutex<RecentTitleLedger>,
}

impl DuplicateDetector {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ledger: Mutex::new(RecentTitleLedger::default()),
        }
    }

    /// Rebuild a detector from persisted titles, oldest first.
    pub fn with_titles<I, S>(capacity: usize, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let detector = Self::new(capacity);
        for title in titles {
            detector.record(title.as_ref());
        }
        detector
    }

    /// Normalized form used for comparisons.
    pub fn normalize(title: &str) -> String {
        title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn is_duplicate(&self, title: &str) -> bool {
        let key = Self::normalize(title);
        self.lock().contains(&key)
    }

    /// `Err(DuplicateConflict)` when the title is already in the window.
    pub fn check(&self, title: &str) -> Result<()> {
        if self.is_duplicate(title) {
            return Err(AppError::DuplicateConflict(title.to_string()));
        }
        Ok(())
    }

    /// Record a processed title, evicting the oldest once over capacity.
    ///
    /// Returns false if the title was already in the window.
    pub fn record(&self, title: &str) -> bool {
        let key = Self::normalize(title);
        if key.is_empty() {
            return false;
        }
        self.lock().insert(key, self.capacity)
    }

    /// Snapshot of the window, oldest first, for persistence.
    pub fn titles(&self) -> Vec<String> {
        self.lock().order.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RecentTitleLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }
}
