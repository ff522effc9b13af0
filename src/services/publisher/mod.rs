//! Republishing into the course portal.
//!
//! [`PublishingSession`] owns one interactive portal session and walks it
//! through login, course and board navigation, composing, attaching and
//! submitting. The low-level surface is the [`PortalDriver`] trait so the
//! state machine can run against a fake in tests and against a real browser
//! (`WebDriverPortal`) in production.

pub mod markup;
mod session;
#[cfg(feature = "webdriver")]
mod webdriver;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{Announcement, PublisherConfig};

pub use session::{PortalDriver, PublishingSession};
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverPortal;

/// Where a publishing session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn,
    OnCourse,
    OnBoard,
    Composing,
    AttachingFiles,
    Submitted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoggedOut => "logged out",
            Self::LoggedIn => "logged in",
            Self::OnCourse => "on course",
            Self::OnBoard => "on board",
            Self::Composing => "composing",
            Self::AttachingFiles => "attaching files",
            Self::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// How many staged files made it into the post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttachOutcome {
    pub attached: usize,
    /// Files left out because the attach controls disappeared
    pub abandoned: usize,
}

/// Summary of one successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub board: String,
    pub attachments: AttachOutcome,
}

/// Posts accepted announcements somewhere.
#[async_trait]
pub trait Publisher: Send {
    /// Post one fully fetched, publishable announcement.
    async fn publish(&mut self, announcement: &Announcement) -> Result<PublishReceipt>;

    /// Release the underlying session.
    async fn close(&mut self) -> Result<()>;
}

/// Reject announcements that cannot be posted before touching the portal.
pub(crate) fn target_board(announcement: &Announcement) -> Result<&'static str> {
    if !announcement.is_ready_to_publish() {
        return Err(AppError::validation(format!(
            "announcement '{}' is not ready to publish",
            announcement.title()
        )));
    }
    announcement
        .category()
        .map(|c| c.label())
        .ok_or_else(|| AppError::validation("announcement has no category"))
}

/// Portal login, read from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_env(config: &PublisherConfig) -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::config(format!("{name} not set")))
        };
        Ok(Self::new(
            read(&config.username_env)?,
            read(&config.password_env)?,
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Logs what would be posted without opening a browser.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    published: Vec<String>,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles "published" so far, in order.
    pub fn published(&self) -> &[String] {
        &self.published
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&mut self, announcement: &Announcement) -> Result<PublishReceipt> {
        let board = target_board(announcement)?;
        let files: Vec<_> = announcement
            .attachments()
            .iter()
            .map(|p| p.file_name().map(Path::new).unwrap_or(p.as_path()).display().to_string())
            .collect();
        log::info!(
            "[dry-run] Would post '{}' to board '{}' with {} attachment(s) {:?}",
            announcement.title(),
            board,
            files.len(),
            files
        );
        self.published.push(announcement.title().to_string());
        Ok(PublishReceipt {
            board: board.to_string(),
            attachments: AttachOutcome {
                attached: files.len(),
                abandoned: 0,
            },
        })
    }

    async fn close(&mut self) -> Result<()> {
        log::info!("[dry-run] {} announcement(s) would have been posted", self.published.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::models::Category;

    fn full(category: Category) -> Announcement {
        Announcement::full(
            "봉사단 모집",
            "https://a.example/1",
            "<p>본문</p>",
            "본문",
            vec![PathBuf::from("/tmp/staging/안내.pdf")],
        )
        .with_category(category)
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::AttachingFiles.to_string(), "attaching files");
        assert_eq!(SessionState::OnCourse.to_string(), "on course");
    }

    #[test]
    fn test_target_board_requires_publishable_full_announcement() {
        assert_eq!(target_board(&full(Category::Volunteering)).unwrap(), "봉사활동");
        assert!(target_board(&full(Category::NotApplicable)).is_err());

        let partial = Announcement::partial("제목", "https://a.example/2", "본문")
            .with_category(Category::Volunteering);
        assert!(matches!(target_board(&partial), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("student", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("student"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_missing_env_is_config_error() {
        let config = PublisherConfig {
            username_env: "NOTICE_RELAY_TEST_UNSET_USER".into(),
            password_env: "NOTICE_RELAY_TEST_UNSET_PASS".into(),
            ..PublisherConfig::default()
        };
        let err = Credentials::from_env(&config).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_dry_run_records_titles() {
        let mut publisher = DryRunPublisher::new();
        let receipt = publisher.publish(&full(Category::Volunteering)).await.unwrap();
        assert_eq!(receipt.board, "봉사활동");
        assert_eq!(receipt.attachments.attached, 1);
        assert_eq!(publisher.published(), ["봉사단 모집"]);
        publisher.close().await.unwrap();
    }
}
