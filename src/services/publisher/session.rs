//! Portal session state machine.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::markup::prepare_body;
use super::{AttachOutcome, Credentials, PublishReceipt, Publisher, SessionState, target_board};
use crate::error::{AppError, Result};
use crate::models::Announcement;

/// Low-level portal controls.
///
/// Every method that waits for a control is bounded and reports an
/// exhausted wait as `AppError::AutomationTimeout`.
#[async_trait]
pub trait PortalDriver: Send {
    /// Submit the login form. `Ok(false)` when the portal rejects the credentials.
    async fn login(&mut self, credentials: &Credentials) -> Result<bool>;

    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Follow the course link whose label contains `name`. `Ok(false)` when absent.
    async fn click_board_link(&mut self, name: &str) -> Result<bool>;

    async fn open_composer(&mut self) -> Result<()>;

    async fn fill_subject(&mut self, subject: &str) -> Result<()>;

    async fn fill_body(&mut self, html: &str) -> Result<()>;

    async fn open_attach_dialog(&mut self) -> Result<()>;

    async fn wait_file_input(&mut self) -> Result<()>;

    async fn supply_file(&mut self, path: &Path) -> Result<()>;

    async fn trigger_upload(&mut self) -> Result<()>;

    async fn click_save(&mut self) -> Result<()>;

    async fn quit(&mut self) -> Result<()>;
}

/// One logged-in portal session.
pub struct PublishingSession<D: PortalDriver> {
    driver: D,
    state: SessionState,
    course_url: String,
}

impl<D: PortalDriver> PublishingSession<D> {
    /// Log in and return a session in the `LoggedIn` state.
    ///
    /// Any login failure is `AutomationFatal`: retrying with the same
    /// credentials would fail for every remaining announcement.
    pub async fn start(
        mut driver: D,
        credentials: &Credentials,
        course_url: impl Into<String>,
    ) -> Result<Self> {
        log::info!("Logging in to portal as {}", credentials.username);
        let failure = match driver.login(credentials).await {
            Ok(true) => None,
            Ok(false) => Some("portal rejected the credentials".to_string()),
            Err(e) => Some(format!("login failed: {e}")),
        };

        if let Some(message) = failure {
            if let Err(e) = driver.quit().await {
                log::warn!("Failed to close portal session: {}", e);
            }
            return Err(AppError::AutomationFatal(message));
        }

        Ok(Self {
            driver,
            state: SessionState::LoggedIn,
            course_url: course_url.into(),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn course_url(&self) -> &str {
        &self.course_url
    }

    fn require(&self, operation: &str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                operation: operation.to_string(),
                state: self.state.to_string(),
            })
        }
    }

    /// Open the course page from any live state.
    pub async fn navigate_course(&mut self, url: &str) -> Result<()> {
        if self.state == SessionState::LoggedOut {
            return Err(AppError::InvalidTransition {
                operation: "navigate to course".into(),
                state: self.state.to_string(),
            });
        }
        self.driver.goto(url).await?;
        self.state = SessionState::OnCourse;
        Ok(())
    }

    pub async fn open_board(&mut self, name: &str) -> Result<()> {
        self.require("open board", &[SessionState::OnCourse])?;
        if !self.driver.click_board_link(name).await? {
            return Err(AppError::BoardNotFound(name.to_string()));
        }
        self.state = SessionState::OnBoard;
        Ok(())
    }

    /// Open the composer and fill it, banner and image classes included.
    pub async fn compose(&mut self, subject: &str, body_html: &str, source_url: &str) -> Result<()> {
        self.require("compose", &[SessionState::OnBoard])?;
        self.driver.open_composer().await?;
        self.driver.fill_subject(subject).await?;
        self.driver
            .fill_body(&prepare_body(body_html, source_url))
            .await?;
        self.state = SessionState::Composing;
        Ok(())
    }

    /// Upload `files` one by one.
    ///
    /// When the attach control or the file input stops appearing, the
    /// remaining files are abandoned and the post is submitted as is. Other
    /// failures, including an upload button that never appears, are errors.
    pub async fn attach(&mut self, files: &[PathBuf]) -> Result<AttachOutcome> {
        self.require("attach files", &[SessionState::Composing])?;
        self.state = SessionState::AttachingFiles;

        let mut outcome = AttachOutcome::default();
        for (index, file) in files.iter().enumerate() {
            let path = std::path::absolute(file)?;

            let ready = match self.driver.open_attach_dialog().await {
                Ok(()) => self.driver.wait_file_input().await,
                Err(e) => Err(e),
            };
            if let Err(e) = ready {
                if e.is_timeout() {
                    outcome.abandoned = files.len() - index;
                    log::warn!(
                        "Attach controls unavailable ({}), submitting without {} file(s)",
                        e,
                        outcome.abandoned
                    );
                    break;
                }
                return Err(e);
            }

            self.driver.supply_file(&path).await?;
            self.driver.trigger_upload().await?;
            outcome.attached += 1;
            log::debug!("Attached {}", path.display());
        }
        Ok(outcome)
    }

    pub async fn submit(&mut self) -> Result<()> {
        self.require(
            "submit",
            &[SessionState::Composing, SessionState::AttachingFiles],
        )?;
        self.driver.click_save().await?;
        self.state = SessionState::Submitted;
        Ok(())
    }
}

#[async_trait]
impl<D: PortalDriver> Publisher for PublishingSession<D> {
    async fn publish(&mut self, announcement: &Announcement) -> Result<PublishReceipt> {
        let board = target_board(announcement)?;
        let course_url = self.course_url.clone();

        self.navigate_course(&course_url).await?;
        self.open_board(board).await?;
        self.compose(
            announcement.title(),
            announcement.content_html(),
            announcement.url(),
        )
        .await?;
        let attachments = if announcement.attachments().is_empty() {
            AttachOutcome::default()
        } else {
            self.attach(announcement.attachments()).await?
        };
        self.submit().await?;

        if let Err(e) = self.navigate_course(&course_url).await {
            log::warn!("Posted, but failed to return to course page: {}", e);
        }

        Ok(PublishReceipt {
            board: board.to_string(),
            attachments,
        })
    }

    async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::LoggedOut {
            return Ok(());
        }
        self.state = SessionState::LoggedOut;
        self.driver.quit().await
    }
}
