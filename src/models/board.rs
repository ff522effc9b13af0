//! Monitored board cursors.

use serde::{Deserialize, Serialize};

/// Discovery cursor for one monitored notice board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCursor {
    /// Listing page that is scanned for new rows
    pub page_url: String,

    /// Base URL that relative detail links are resolved against
    pub default_url: String,

    /// Highest announcement number already processed
    #[serde(alias = "number", default)]
    pub last_seen_number: u64,
}

impl BoardCursor {
    pub fn new(page_url: impl Into<String>, default_url: impl Into<String>, last_seen: u64) -> Self {
        Self {
            page_url: page_url.into(),
            default_url: default_url.into(),
            last_seen_number: last_seen,
        }
    }
}

/// On-disk layout of the cursor file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardList {
    #[serde(default)]
    pub boards: Vec<BoardCursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_legacy_number_column() {
        let json = r#"{"boards":[{"page_url":"https://a/list","default_url":"https://a","number":42}]}"#;
        let list: BoardList = serde_json::from_str(json).unwrap();
        assert_eq!(list.boards[0].last_seen_number, 42);
    }

    #[test]
    fn test_missing_number_defaults_to_zero() {
        let json = r#"{"boards":[{"page_url":"https://a/list","default_url":"https://a"}]}"#;
        let list: BoardList = serde_json::from_str(json).unwrap();
        assert_eq!(list.boards[0].last_seen_number, 0);
    }
}
