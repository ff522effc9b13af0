//! Keyword rules with oracle fallback.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Category, ClassifierConfig};
use crate::services::CategoryOracle;
use crate::utils::truncate_graphemes;

/// Files announcements into categories.
///
/// Order of evaluation:
/// 1. Exclusion keywords anywhere in title or body → [`Category::Excluded`]
/// 2. Inclusion rules against the title only, first match wins
/// 3. The oracle, on a truncated title + body
pub struct Classifier {
    config: ClassifierConfig,
    oracle: Arc<dyn CategoryOracle>,
}

impl Classifier {
    pub fn new(config: ClassifierConfig, oracle: Arc<dyn CategoryOracle>) -> Self {
        Self { config, oracle }
    }

    /// Keyword-only verdict; `None` means the oracle must decide.
    pub fn match_keywords(&self, title: &str, content_text: &str) -> Option<Category> {
        let haystack = format!("{title}{content_text}");
        if let Some(keyword) = self
            .config
            .exclude_keywords
            .iter()
            .find(|k| !k.is_empty() && haystack.contains(k.as_str()))
        {
            log::debug!("Excluded by keyword '{}': {}", keyword, title);
            return Some(Category::Excluded);
        }

        self.config
            .rules
            .iter()
            .find(|rule| !rule.keyword.is_empty() && title.contains(&rule.keyword))
            .map(|rule| rule.category)
    }

    /// Text handed to the oracle, capped to the configured budget.
    pub fn oracle_input(&self, title: &str, content_text: &str) -> String {
        let combined = format!("{title}\n{content_text}");
        truncate_graphemes(&combined, self.config.oracle_char_budget()).to_string()
    }

    /// Classify an announcement.
    ///
    /// Oracle failures and unknown verdicts are returned as
    /// `AppError::Classification`; no default category is substituted.
    pub async fn classify(&self, title: &str, content_text: &str) -> Result<Category> {
        if let Some(category) = self.match_keywords(title, content_text) {
            return Ok(category);
        }

        let input = self.oracle_input(title, content_text);
        let verdict = self.oracle.classify_text(&input).await?;
        verdict.parse()
    }
}
