//! Announcement categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Closed set of interest categories an announcement can be filed under.
///
/// Every publishable category maps to a board of the same label on the
/// course page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ContestEngineering,
    ContestIdea,
    ContestArt,
    ContestLiterature,
    ContestOther,
    Education,
    Scholarship,
    Supporters,
    Volunteering,
    Employment,
    NotApplicable,
    /// An exclusion keyword matched; nothing else was evaluated.
    Excluded,
}

impl Category {
    /// Categories that have a target board, in label order.
    pub const PUBLISHABLE: [Category; 10] = [
        Category::ContestEngineering,
        Category::ContestIdea,
        Category::ContestArt,
        Category::ContestLiterature,
        Category::ContestOther,
        Category::Education,
        Category::Scholarship,
        Category::Supporters,
        Category::Volunteering,
        Category::Employment,
    ];

    /// Display label, identical to the target board name.
    pub fn label(&self) -> &'static str {
        match self {
            Category::ContestEngineering => "[공모전] 공학/IT/SW",
            Category::ContestIdea => "[공모전] 아이디어/기획",
            Category::ContestArt => "[공모전] 미술/디자인/건축",
            Category::ContestLiterature => "[공모전] 문학/수기/에세이",
            Category::ContestOther => "[공모전] 기타",
            Category::Education => "교육/특강/프로그램",
            Category::Scholarship => "장학금",
            Category::Supporters => "서포터즈",
            Category::Volunteering => "봉사활동",
            Category::Employment => "취업 정보",
            Category::NotApplicable => "해당없음",
            Category::Excluded => "제외",
        }
    }

    /// Whether announcements of this category are posted to the course.
    pub fn is_publishable(&self) -> bool {
        !matches!(self, Category::NotApplicable | Category::Excluded)
    }

    /// Parse an oracle verdict.
    ///
    /// Tolerates surrounding whitespace and quotes, but otherwise requires an
    /// exact label. The sentinel is never a valid verdict.
    pub fn from_label(label: &str) -> Option<Self> {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '.'))
            .trim();
        Self::PUBLISHABLE
            .iter()
            .chain(std::iter::once(&Category::NotApplicable))
            .copied()
            .find(|c| c.label() == cleaned)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
            .ok_or_else(|| AppError::classification(format!("unknown category label '{}'", s.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip_for_publishable() {
        for category in Category::PUBLISHABLE {
            assert_eq!(Category::from_label(category.label()), Some(category));
            assert!(category.is_publishable());
        }
    }

    #[test]
    fn test_not_applicable_is_parsed_but_not_publishable() {
        let category: Category = "해당없음".parse().unwrap();
        assert_eq!(category, Category::NotApplicable);
        assert!(!category.is_publishable());
    }

    #[test]
    fn test_sentinel_is_not_a_verdict() {
        assert_eq!(Category::from_label("제외"), None);
        assert!(!Category::Excluded.is_publishable());
    }

    #[test]
    fn test_from_label_tolerates_quotes() {
        assert_eq!(Category::from_label(" \"장학금\"\n"), Some(Category::Scholarship));
        assert_eq!(
            Category::from_label("'[공모전] 기타'."),
            Some(Category::ContestOther)
        );
    }

    #[test]
    fn test_unknown_label_is_classification_error() {
        let err = "장학".parse::<Category>().unwrap_err();
        assert!(matches!(err, AppError::Classification(_)));
    }

    #[test]
    fn test_serde_uses_snake_case_ids() {
        let json = serde_json::to_string(&Category::ContestIdea).unwrap();
        assert_eq!(json, "\"contest_idea\"");
    }
}
