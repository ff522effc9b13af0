//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Category;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Listing and detail page anchors
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// File locations under the storage directory
    #[serde(default)]
    pub storage: StorageConfig,

    /// Recent-title ledger settings
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Keyword rules and oracle budget
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Categorization oracle endpoint
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Publishing portal session
    #[serde(default)]
    pub publisher: PublisherConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.dedup.capacity == 0 {
            return Err(AppError::validation("dedup.capacity must be > 0"));
        }
        if self.classifier.max_oracle_tokens == 0 || self.classifier.tokens_per_char == 0 {
            return Err(AppError::validation(
                "classifier.max_oracle_tokens and classifier.tokens_per_char must be > 0",
            ));
        }
        if let Some(rule) = self
            .classifier
            .rules
            .iter()
            .find(|r| !r.category.is_publishable())
        {
            return Err(AppError::validation(format!(
                "classifier rule '{}' maps to unpublishable category {}",
                rule.keyword, rule.category
            )));
        }
        if self.selectors.download_pattern.trim().is_empty() {
            return Err(AppError::validation("selectors.download_pattern is empty"));
        }
        if self.publisher.element_timeout_secs == 0 || self.publisher.attach_timeout_secs == 0 {
            return Err(AppError::validation("publisher wait budgets must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between announcements in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// CSS anchors for the listing and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Cells holding the numeric row identifier
    #[serde(default = "defaults::number_cell")]
    pub number_cell: String,

    /// Cells holding the row title
    #[serde(default = "defaults::title_cell")]
    pub title_cell: String,

    /// Detail link inside a title cell
    #[serde(default = "defaults::title_link")]
    pub title_link: String,

    /// Title heading on the detail page
    #[serde(default = "defaults::detail_title")]
    pub detail_title: String,

    /// Body container on the detail page
    #[serde(default = "defaults::detail_body")]
    pub detail_body: String,

    /// Attachment links on the detail page
    #[serde(default = "defaults::attachment_link")]
    pub attachment_link: String,

    /// Regex an attachment href must match to be downloaded
    #[serde(default = "defaults::download_pattern")]
    pub download_pattern: String,

    /// Path marker; the final URL is cut here to form the resource base
    #[serde(default = "defaults::base_path_marker")]
    pub base_path_marker: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            number_cell: defaults::number_cell(),
            title_cell: defaults::title_cell(),
            title_link: defaults::title_link(),
            detail_title: defaults::detail_title(),
            detail_body: defaults::detail_body(),
            attachment_link: defaults::attachment_link(),
            download_pattern: defaults::download_pattern(),
            base_path_marker: defaults::base_path_marker(),
        }
    }
}

/// File names relative to the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::cursor_file")]
    pub cursor_file: String,

    #[serde(default = "defaults::ledger_file")]
    pub ledger_file: String,

    #[serde(default = "defaults::report_file")]
    pub report_file: String,

    /// Staging directory for downloaded attachments
    #[serde(default = "defaults::download_dir")]
    pub download_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cursor_file: defaults::cursor_file(),
            ledger_file: defaults::ledger_file(),
            report_file: defaults::report_file(),
            download_dir: defaults::download_dir(),
        }
    }
}

/// Recent-title ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Number of titles kept before the oldest is evicted
    #[serde(default = "defaults::ledger_capacity")]
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::ledger_capacity(),
        }
    }
}

/// A title keyword that files an announcement directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: Category,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, category: Category) -> Self {
        Self {
            keyword: keyword.into(),
            category,
        }
    }
}

/// Keyword rules and oracle budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Any of these in title or body excludes the announcement
    #[serde(default = "defaults::exclude_keywords")]
    pub exclude_keywords: Vec<String>,

    /// Title keyword rules, first match wins
    #[serde(default = "defaults::keyword_rules")]
    pub rules: Vec<KeywordRule>,

    /// Approximate token cap for oracle input
    #[serde(default = "defaults::max_oracle_tokens")]
    pub max_oracle_tokens: usize,

    /// Estimated tokens consumed per character of Korean text
    #[serde(default = "defaults::tokens_per_char")]
    pub tokens_per_char: usize,
}

impl ClassifierConfig {
    /// Character budget derived from the token cap.
    pub fn oracle_char_budget(&self) -> usize {
        self.max_oracle_tokens / self.tokens_per_char.max(1)
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            exclude_keywords: defaults::exclude_keywords(),
            rules: defaults::keyword_rules(),
            max_oracle_tokens: defaults::max_oracle_tokens(),
            tokens_per_char: defaults::tokens_per_char(),
        }
    }
}

/// Chat-completions endpoint used as the categorization oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "defaults::oracle_endpoint")]
    pub endpoint: String,

    #[serde(default = "defaults::oracle_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "defaults::oracle_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "defaults::oracle_timeout")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::oracle_endpoint(),
            model: defaults::oracle_model(),
            api_key_env: defaults::oracle_api_key_env(),
            timeout_secs: defaults::oracle_timeout(),
        }
    }
}

/// Publishing portal session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// WebDriver server (chromedriver) URL
    #[serde(default = "defaults::webdriver_url")]
    pub webdriver_url: String,

    /// Portal landing page holding the login form
    #[serde(default = "defaults::portal_url")]
    pub portal_url: String,

    /// Course page listing the target boards
    #[serde(default = "defaults::course_url")]
    pub course_url: String,

    #[serde(default = "defaults::headless")]
    pub headless: bool,

    #[serde(default = "defaults::window_size")]
    pub window_size: String,

    /// Environment variable holding the portal user name
    #[serde(default = "defaults::username_env")]
    pub username_env: String,

    /// Environment variable holding the portal password
    #[serde(default = "defaults::password_env")]
    pub password_env: String,

    /// Wait budget for ordinary controls
    #[serde(default = "defaults::element_timeout")]
    pub element_timeout_secs: u64,

    /// Wait budget for attach controls and the save button
    #[serde(default = "defaults::attach_timeout")]
    pub attach_timeout_secs: u64,

    /// Poll interval while waiting for controls
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub selectors: PortalSelectors,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::webdriver_url(),
            portal_url: defaults::portal_url(),
            course_url: defaults::course_url(),
            headless: defaults::headless(),
            window_size: defaults::window_size(),
            username_env: defaults::username_env(),
            password_env: defaults::password_env(),
            element_timeout_secs: defaults::element_timeout(),
            attach_timeout_secs: defaults::attach_timeout(),
            poll_interval_ms: defaults::poll_interval(),
            selectors: PortalSelectors::default(),
        }
    }
}

/// Locators for the portal controls. `*_xpath` fields are XPath, the rest CSS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSelectors {
    pub username_input: String,
    pub password_input: String,
    pub login_button: String,
    /// Present after a rejected login
    pub login_error: String,
    /// `{name}` is replaced with the board label
    pub board_link_xpath: String,
    pub write_button_xpath: String,
    pub subject_input: String,
    pub body_editor: String,
    pub attach_button: String,
    pub file_input: String,
    pub upload_button: String,
    pub save_button: String,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            username_input: "#input-username".into(),
            password_input: "#input-password".into(),
            login_button: "[name=\"loginbutton\"]".into(),
            login_error: "#loginerrormessage, .loginerrors".into(),
            board_link_xpath:
                "//a[span[contains(@class, \"instancename\") and contains(text(), \"{name}\")]]"
                    .into(),
            write_button_xpath: "//a[contains(text(), \"쓰기\")]".into(),
            subject_input: "[name=\"subject\"]".into(),
            body_editor: "#id_contenteditable".into(),
            attach_button: "a[role=\"button\"][title=\"추가 ...\"].btn.btn-default.btn-sm".into(),
            file_input: "input[type=\"file\"]".into(),
            upload_button: "button.fp-upload-btn.btn-primary.btn".into(),
            save_button: "input[type=\"submit\"].btn-primary".into(),
        }
    }
}

mod defaults {
    use super::KeywordRule;
    use crate::models::Category;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; notice-relay/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Page anchors
    pub fn number_cell() -> String {
        "tbody td._artclTdNum".into()
    }
    pub fn title_cell() -> String {
        "tbody td._artclTdTitle".into()
    }
    pub fn title_link() -> String {
        "a.artclLinkView".into()
    }
    pub fn detail_title() -> String {
        "h2.artclViewTitle".into()
    }
    pub fn detail_body() -> String {
        "div.artclView".into()
    }
    pub fn attachment_link() -> String {
        "dd.artclInsert li a".into()
    }
    pub fn download_pattern() -> String {
        r"download\.do".into()
    }
    pub fn base_path_marker() -> String {
        "/bbs/".into()
    }

    // Storage defaults
    pub fn cursor_file() -> String {
        "boards.json".into()
    }
    pub fn ledger_file() -> String {
        "recent_titles.json".into()
    }
    pub fn report_file() -> String {
        "last_run.json".into()
    }
    pub fn download_dir() -> String {
        "downloads".into()
    }

    pub fn ledger_capacity() -> usize {
        100
    }

    // Classifier defaults
    pub fn exclude_keywords() -> Vec<String> {
        [
            "대출",
            "재입학",
            "진학",
            "조교",
            "수강 신청",
            "수강신청",
            "수강 지도",
            "수강지도",
            "취소",
            "연기",
            "변경",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn keyword_rules() -> Vec<KeywordRule> {
        vec![
            KeywordRule::new("장학금", Category::Scholarship),
            KeywordRule::new("장학생", Category::Scholarship),
            KeywordRule::new("지원금", Category::Scholarship),
            KeywordRule::new("인턴", Category::Employment),
            KeywordRule::new("일자리", Category::Employment),
            KeywordRule::new("공개모집", Category::Employment),
            KeywordRule::new("채용", Category::Employment),
            KeywordRule::new("공채", Category::Employment),
            KeywordRule::new("현장실습", Category::Employment),
        ]
    }
    pub fn max_oracle_tokens() -> usize {
        1000
    }
    pub fn tokens_per_char() -> usize {
        2
    }

    // Oracle defaults
    pub fn oracle_endpoint() -> String {
        "https://api.openai.com/v1".into()
    }
    pub fn oracle_model() -> String {
        "gpt-4o-mini".into()
    }
    pub fn oracle_api_key_env() -> String {
        "OPENAI_API_KEY".into()
    }
    pub fn oracle_timeout() -> u64 {
        60
    }

    // Publisher defaults
    pub fn webdriver_url() -> String {
        "http://localhost:9515".into()
    }
    pub fn portal_url() -> String {
        "https://plato.pusan.ac.kr/".into()
    }
    pub fn course_url() -> String {
        "https://plato.pusan.ac.kr/course/view.php?id=157301".into()
    }
    pub fn headless() -> bool {
        true
    }
    pub fn window_size() -> String {
        "1920,1080".into()
    }
    pub fn username_env() -> String {
        "PORTAL_USERNAME".into()
    }
    pub fn password_env() -> String {
        "PORTAL_PASSWORD".into()
    }
    pub fn element_timeout() -> u64 {
        10
    }
    pub fn attach_timeout() -> u64 {
        5
    }
    pub fn poll_interval() -> u64 {
        250
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.dedup.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_rule_to_not_applicable() {
        let mut config = Config::default();
        config
            .classifier
            .rules
            .push(KeywordRule::new("안내", Category::NotApplicable));
        assert!(config.validate().is_err());
    }

    #[test]
    fn oracle_budget_is_about_500_chars() {
        assert_eq!(ClassifierConfig::default().oracle_char_budget(), 500);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [dedup]
            capacity = 5

            [[classifier.rules]]
            keyword = "봉사"
            category = "volunteering"
            "#,
        )
        .unwrap();

        assert_eq!(config.dedup.capacity, 5);
        assert_eq!(config.classifier.rules.len(), 1);
        assert_eq!(config.classifier.rules[0].category, Category::Volunteering);
        assert_eq!(config.classifier.exclude_keywords.len(), 11);
        assert_eq!(config.selectors.title_link, "a.artclLinkView");
    }

    #[test]
    fn bundled_sample_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("storage/config.toml");
        let config = Config::load(path).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.crawler.request_delay_ms, 500);
        assert_eq!(config.classifier.rules, ClassifierConfig::default().rules);
        assert_eq!(config.classifier.exclude_keywords, ClassifierConfig::default().exclude_keywords);
        assert_eq!(config.publisher.attach_timeout_secs, 5);
    }
}
