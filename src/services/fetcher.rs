// src/services/fetcher.rs

//! Announcement detail page retrieval.
//!
//! Fetches detail pages in two fidelities: a cheap partial read used for
//! filtering, and a full read that rewrites image references and stages
//! attachments on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Announcement, SelectorConfig};
use crate::services::{AnnouncementSource, parse_selector};
use crate::utils::http::{fetch_bytes, fetch_page};
use crate::utils::{normalize_whitespace, resolve_url};

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\ssrc\s*=\s*")([^"]*)(")"#).expect("valid img src regex")
});

/// A downloadable attachment found on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentLink {
    /// Displayed link text, used as the local file name
    pub name: String,
    /// Absolute download URL
    pub url: String,
}

/// Parsed selectors for detail pages.
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    title: Selector,
    body: Selector,
    attachment_link: Selector,
    download_pattern: Regex,
    base_path_marker: String,
}

/// Everything the full fetch needs from the page, extracted up front.
#[derive(Debug)]
struct FullExtract {
    title: String,
    content_html: String,
    content_text: String,
    attachments: Vec<AttachmentLink>,
}

impl DetailSelectors {
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        let download_pattern = Regex::new(&config.download_pattern).map_err(|e| {
            AppError::config(format!(
                "invalid selectors.download_pattern '{}': {e}",
                config.download_pattern
            ))
        })?;

        Ok(Self {
            title: parse_selector(&config.detail_title)?,
            body: parse_selector(&config.detail_body)?,
            attachment_link: parse_selector(&config.attachment_link)?,
            download_pattern,
            base_path_marker: config.base_path_marker.clone(),
        })
    }

    /// Parse the title and plain text of a detail page.
    pub fn parse_partial(&self, html: &str, url: &str) -> Result<Announcement> {
        let document = Html::parse_document(html);
        let title = self.title_of(&document, url)?;
        let body = self.body_of(&document, url)?;
        Ok(Announcement::partial(title, url, plain_text(&body)))
    }

    fn extract_full(&self, html: &str, url: &str, final_url: &Url) -> Result<FullExtract> {
        let document = Html::parse_document(html);
        let base = resource_base(final_url, &self.base_path_marker);

        // Only the body container is required here; the caller already holds
        // the title from the partial read.
        let title = self.title_of(&document, url).unwrap_or_else(|e| {
            log::debug!("{}", e);
            String::new()
        });
        let body = self.body_of(&document, url)?;

        Ok(FullExtract {
            title,
            content_html: rewrite_image_sources(&body.html(), &base),
            content_text: plain_text(&body),
            attachments: self.attachment_links(&document, &base),
        })
    }

    /// Attachment links whose href matches the download endpoint pattern.
    pub fn attachment_links(&self, document: &Html, base: &Url) -> Vec<AttachmentLink> {
        document
            .select(&self.attachment_link)
            .filter_map(|link| {
                let href = link.value().attr("href")?.trim();
                if !self.download_pattern.is_match(href) {
                    return None;
                }
                Some(AttachmentLink {
                    name: normalize_whitespace(&link.text().collect::<String>()),
                    url: resolve_url(base, href),
                })
            })
            .collect()
    }

    fn title_of(&self, document: &Html, url: &str) -> Result<String> {
        document
            .select(&self.title)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .ok_or_else(|| AppError::fetch(url, "title heading not found"))
    }

    fn body_of<'a>(&self, document: &'a Html, url: &str) -> Result<ElementRef<'a>> {
        document
            .select(&self.body)
            .next()
            .ok_or_else(|| AppError::fetch(url, "content container not found"))
    }
}

fn plain_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Base URL that embedded resources are resolved against.
///
/// The final URL is cut at `marker` (e.g. `/bbs/`) when present.
pub fn resource_base(final_url: &Url, marker: &str) -> Url {
    let raw = final_url.as_str();
    match raw.find(marker) {
        Some(idx) if !marker.is_empty() => {
            Url::parse(&raw[..idx]).unwrap_or_else(|_| final_url.clone())
        }
        _ => final_url.clone(),
    }
}

/// Rewrite every `<img src>` in `html` to an absolute URL.
pub fn rewrite_image_sources(html: &str, base: &Url) -> String {
    IMG_SRC
        .replace_all(html, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], resolve_url(base, caps[2].trim()), &caps[3])
        })
        .into_owned()
}

/// Turn link text into a safe, unique file name.
fn file_name_for(name: &str, index: usize, taken: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();

    let mut candidate = if cleaned.is_empty() {
        format!("attachment-{}", index + 1)
    } else {
        cleaned
    };
    if taken.contains(&candidate) {
        candidate = format!("{}-{}", index + 1, candidate);
    }
    taken.insert(candidate.clone());
    candidate
}

/// Service for fetching announcement detail pages.
pub struct AnnouncementFetcher {
    client: Client,
    selectors: DetailSelectors,
    download_dir: PathBuf,
}

impl AnnouncementFetcher {
    /// Create a fetcher staging attachments under `download_dir`.
    pub fn new(client: Client, selectors: &SelectorConfig, download_dir: &Path) -> Result<Self> {
        Ok(Self {
            client,
            selectors: DetailSelectors::from_config(selectors)?,
            download_dir: std::path::absolute(download_dir)?,
        })
    }

    /// Per-announcement staging directory.
    fn staging_dir(&self, url: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(url.as_bytes()));
        self.download_dir.join(&digest[..16])
    }

    /// Download attachments one by one; failures skip only that file.
    async fn download_attachments(&self, url: &str, links: &[AttachmentLink]) -> Vec<PathBuf> {
        if links.is_empty() {
            return Vec::new();
        }

        let dir = self.staging_dir(url);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            log::warn!("Cannot create attachment directory {}: {}", dir.display(), e);
            return Vec::new();
        }

        let mut taken = HashSet::new();
        let mut files = Vec::new();
        for (index, link) in links.iter().enumerate() {
            let path = dir.join(file_name_for(&link.name, index, &mut taken));
            match self.download_one(&link.url, &path).await {
                Ok(()) => {
                    log::info!("Downloaded attachment {}", path.display());
                    files.push(path);
                }
                Err(e) => log::warn!("Skipping attachment '{}' ({}): {}", link.name, link.url, e),
            }
        }
        files
    }

    async fn download_one(&self, url: &str, path: &Path) -> Result<()> {
        let bytes = fetch_bytes(&self.client, url).await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl AnnouncementSource for AnnouncementFetcher {
    async fn fetch_partial(&self, url: &str) -> Option<Announcement> {
        let page = match fetch_page(&self.client, url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Failed to fetch announcement {}: {}", url, e);
                return None;
            }
        };

        match self.selectors.parse_partial(&page.body, url) {
            Ok(ann) => Some(ann),
            Err(e) => {
                log::warn!("Failed to parse announcement: {}", e);
                None
            }
        }
    }

    async fn fetch_full(&self, url: &str) -> Option<Announcement> {
        let page = match fetch_page(&self.client, url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Failed to fetch announcement {}: {}", url, e);
                return None;
            }
        };

        let extract = match self.selectors.extract_full(&page.body, url, &page.final_url) {
            Ok(extract) => extract,
            Err(e) => {
                log::warn!("Failed to parse announcement: {}", e);
                return None;
            }
        };

        let files = self.download_attachments(url, &extract.attachments).await;
        if files.len() < extract.attachments.len() {
            log::warn!(
                "{} of {} attachment(s) staged for '{}'",
                files.len(),
                extract.attachments.len(),
                extract.title
            );
        }

        Some(Announcement::full(
            extract.title,
            url,
            extract.content_html,
            extract.content_text,
            files,
        ))
    }

    async fn release(&self, announcement: &Announcement) {
        let dir = self.staging_dir(announcement.url());
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => log::debug!("Removed staged attachments {}", dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove {}: {}", dir.display(), e),
        }
    }
}
