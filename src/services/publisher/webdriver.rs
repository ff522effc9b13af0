//! Browser-backed portal driver.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;

use super::Credentials;
use super::session::PortalDriver;
use crate::error::{AppError, Result};
use crate::models::{PortalSelectors, PublisherConfig};

const INJECT_BODY: &str = r#"
    arguments[0].innerHTML = arguments[1];
    arguments[0].focus();
    arguments[0].dispatchEvent(new Event('focus', { bubbles: true }));
    arguments[0].dispatchEvent(new Event('blur', { bubbles: true }));
    arguments[0].blur();
"#;

/// Seconds to look for a login error banner after submitting the form.
const LOGIN_CHECK_SECS: u64 = 3;

/// [`PortalDriver`] over a chromedriver session.
pub struct WebDriverPortal {
    driver: WebDriver,
    selectors: PortalSelectors,
    portal_url: String,
    element_timeout: Duration,
    attach_timeout: Duration,
    poll_interval: Duration,
}

impl WebDriverPortal {
    /// Start a browser session against `config.webdriver_url`.
    pub async fn connect(config: &PublisherConfig, user_agent: &str) -> Result<Self> {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-gpu".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--lang=ko_KR".to_string(),
            format!("--window-size={}", config.window_size),
            format!("--user-agent={user_agent}"),
        ];
        if config.headless {
            args.insert(0, "--headless=new".to_string());
        }

        let mut caps = DesiredCapabilities::chrome();
        caps.add_chrome_option("args", args)?;

        log::info!("Connecting to WebDriver at {}", config.webdriver_url);
        let driver = WebDriver::new(&config.webdriver_url, caps).await?;

        Ok(Self {
            driver,
            selectors: config.selectors.clone(),
            portal_url: config.portal_url.clone(),
            element_timeout: Duration::from_secs(config.element_timeout_secs),
            attach_timeout: Duration::from_secs(config.attach_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    /// Wait for `by`, reporting an exhausted wait as a timeout on `control`.
    async fn wait_for(&self, control: &str, by: By, timeout: Duration) -> Result<WebElement> {
        self.driver
            .query(by)
            .wait(timeout, self.poll_interval)
            .first()
            .await
            .map_err(|e| match e {
                WebDriverError::NoSuchElement(..) => AppError::timeout(control, timeout),
                other => AppError::WebDriver(other),
            })
    }

    async fn js_click(&self, element: &WebElement) -> Result<()> {
        self.driver
            .execute("arguments[0].click();", vec![element.to_json()?])
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PortalDriver for WebDriverPortal {
    async fn login(&mut self, credentials: &Credentials) -> Result<bool> {
        self.driver.goto(&self.portal_url).await?;

        let username = self
            .wait_for(
                "username input",
                By::Css(self.selectors.username_input.as_str()),
                self.element_timeout,
            )
            .await?;
        username.send_keys(credentials.username.as_str()).await?;

        let password = self
            .wait_for(
                "password input",
                By::Css(self.selectors.password_input.as_str()),
                self.element_timeout,
            )
            .await?;
        password.send_keys(credentials.password.as_str()).await?;

        let button = self
            .wait_for(
                "login button",
                By::Css(self.selectors.login_button.as_str()),
                self.element_timeout,
            )
            .await?;
        button.click().await?;

        let rejected = self
            .driver
            .query(By::Css(self.selectors.login_error.as_str()))
            .wait(Duration::from_secs(LOGIN_CHECK_SECS), self.poll_interval)
            .exists()
            .await?;
        Ok(!rejected)
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn click_board_link(&mut self, name: &str) -> Result<bool> {
        let xpath = self.selectors.board_link_xpath.replace("{name}", name);
        match self
            .wait_for("board link", By::XPath(xpath.as_str()), self.element_timeout)
            .await
        {
            Ok(link) => {
                link.click().await?;
                Ok(true)
            }
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn open_composer(&mut self) -> Result<()> {
        let button = self
            .wait_for(
                "write button",
                By::XPath(self.selectors.write_button_xpath.as_str()),
                self.element_timeout,
            )
            .await?;
        self.driver
            .execute("arguments[0].scrollIntoView(true);", vec![button.to_json()?])
            .await?;
        self.js_click(&button).await
    }

    async fn fill_subject(&mut self, subject: &str) -> Result<()> {
        let input = self
            .wait_for(
                "subject input",
                By::Css(self.selectors.subject_input.as_str()),
                self.element_timeout,
            )
            .await?;
        input.send_keys(subject).await?;
        Ok(())
    }

    async fn fill_body(&mut self, html: &str) -> Result<()> {
        let editor = self
            .wait_for(
                "body editor",
                By::Css(self.selectors.body_editor.as_str()),
                self.element_timeout,
            )
            .await?;
        self.driver
            .execute(
                INJECT_BODY,
                vec![editor.to_json()?, serde_json::Value::from(html)],
            )
            .await?;
        Ok(())
    }

    async fn open_attach_dialog(&mut self) -> Result<()> {
        let button = self
            .wait_for(
                "attach button",
                By::Css(self.selectors.attach_button.as_str()),
                self.attach_timeout,
            )
            .await?;
        self.js_click(&button).await
    }

    async fn wait_file_input(&mut self) -> Result<()> {
        self.wait_for(
            "file input",
            By::Css(self.selectors.file_input.as_str()),
            self.attach_timeout,
        )
        .await?;
        Ok(())
    }

    async fn supply_file(&mut self, path: &Path) -> Result<()> {
        let input = self
            .wait_for(
                "file input",
                By::Css(self.selectors.file_input.as_str()),
                self.attach_timeout,
            )
            .await?;
        input.send_keys(path.display().to_string()).await?;
        Ok(())
    }

    async fn trigger_upload(&mut self) -> Result<()> {
        let button = self
            .wait_for(
                "upload button",
                By::Css(self.selectors.upload_button.as_str()),
                self.attach_timeout,
            )
            .await?;
        self.js_click(&button).await
    }

    async fn click_save(&mut self) -> Result<()> {
        let button = self
            .wait_for(
                "save button",
                By::Css(self.selectors.save_button.as_str()),
                self.attach_timeout,
            )
            .await?;
        self.js_click(&button).await
    }

    async fn quit(&mut self) -> Result<()> {
        self.driver.clone().quit().await?;
        Ok(())
    }
}
