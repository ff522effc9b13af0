//! Announcement data structure.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// How much of an announcement has been retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fidelity {
    /// Title and plain text only
    Partial,
    /// Rewritten HTML body and downloaded attachments
    Full,
}

/// A single announcement read from a detail page.
///
/// Instances are never mutated after construction. Re-fetching or assigning a
/// category produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    title: String,
    url: String,
    content_html: String,
    content_text: String,
    category: Option<Category>,
    attachments: Vec<PathBuf>,
    fidelity: Fidelity,
}

impl Announcement {
    /// Build a partial announcement (title + plain text).
    pub fn partial(
        title: impl Into<String>,
        url: impl Into<String>,
        content_text: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content_html: String::new(),
            content_text: content_text.into(),
            category: None,
            attachments: Vec::new(),
            fidelity: Fidelity::Partial,
        }
    }

    /// Build a full announcement with rewritten HTML and local attachments.
    pub fn full(
        title: impl Into<String>,
        url: impl Into<String>,
        content_html: impl Into<String>,
        content_text: impl Into<String>,
        attachments: Vec<PathBuf>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content_html: content_html.into(),
            content_text: content_text.into(),
            category: None,
            attachments,
            fidelity: Fidelity::Full,
        }
    }

    /// Return a copy filed under `category`.
    pub fn with_category(self, category: Category) -> Self {
        Self {
            category: Some(category),
            ..self
        }
    }

    /// Return a copy carrying `title`.
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content_html(&self) -> &str {
        &self.content_html
    }

    pub fn content_text(&self) -> &str {
        &self.content_text
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Absolute paths of the staged attachment files.
    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    pub fn fidelity(&self) -> Fidelity {
        self.fidelity
    }

    /// Whether this announcement may be handed to the publisher.
    pub fn is_ready_to_publish(&self) -> bool {
        self.fidelity == Fidelity::Full && self.category.is_some_and(|c| c.is_publishable())
    }
}
