// src/services/discovery.rs

//! New-row discovery on board listing pages.
//!
//! Listings show numbered rows newest first. The highest visible number is
//! compared with the board cursor; the difference bounds how many detail
//! links are collected from the top of the listing.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{BoardCursor, SelectorConfig};
use crate::services::{BoardScanner, parse_selector};
use crate::utils::http::fetch_page;
use crate::utils::resolve_url;

/// Result of scanning one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Absolute detail URLs, oldest first
    pub urls: Vec<String>,

    /// Highest announcement number seen on the listing
    pub latest_number: u64,
}

impl Discovery {
    /// Nothing found; the cursor must not move.
    pub fn unchanged(cursor: &BoardCursor) -> Self {
        Self {
            urls: Vec::new(),
            latest_number: cursor.last_seen_number,
        }
    }
}

/// Parsed selectors for listing pages.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    number_cell: Selector,
    title_cell: Selector,
    title_link: Selector,
}

impl ListingSelectors {
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            number_cell: parse_selector(&config.number_cell)?,
            title_cell: parse_selector(&config.title_cell)?,
            title_link: parse_selector(&config.title_link)?,
        })
    }

    /// Compute the new detail URLs on a listing relative to `cursor`.
    pub fn plan(&self, html: &str, cursor: &BoardCursor) -> Discovery {
        let document = Html::parse_document(html);

        let max_id = document
            .select(&self.number_cell)
            .filter_map(|cell| parse_row_number(&cell.text().collect::<String>()))
            .max();

        let Some(max_id) = max_id else {
            log::warn!("No numbered rows found on {}", cursor.page_url);
            return Discovery::unchanged(cursor);
        };

        if max_id <= cursor.last_seen_number {
            log::info!("No new announcements on {}", cursor.page_url);
            return Discovery {
                urls: Vec::new(),
                latest_number: max_id,
            };
        }

        let base = match Url::parse(&cursor.default_url).or_else(|_| Url::parse(&cursor.page_url))
        {
            Ok(base) => base,
            Err(e) => {
                log::warn!("Unusable base URL for {}: {}", cursor.page_url, e);
                return Discovery::unchanged(cursor);
            }
        };

        let difference = usize::try_from(max_id - cursor.last_seen_number).unwrap_or(usize::MAX);
        log::info!(
            "{} new announcement(s) expected on {} (latest #{})",
            difference,
            cursor.page_url,
            max_id
        );

        let mut urls = Vec::new();
        for cell in document.select(&self.title_cell) {
            if urls.len() >= difference {
                break;
            }
            let href = cell
                .select(&self.title_link)
                .next()
                .and_then(|link| link.value().attr("href"));
            if let Some(href) = href {
                urls.push(resolve_url(&base, href.trim()));
            }
        }

        if urls.len() < difference {
            log::debug!(
                "Collected {} of {} expected links on {}",
                urls.len(),
                difference,
                cursor.page_url
            );
        }

        urls.reverse();
        Discovery {
            urls,
            latest_number: max_id,
        }
    }
}

/// Row numbers are plain digit runs; pinned rows show labels instead.
fn parse_row_number(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Service for discovering new announcements on board listings.
pub struct AnnouncementDiscovery {
    client: Client,
    selectors: ListingSelectors,
}

impl AnnouncementDiscovery {
    pub fn new(client: Client, selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            client,
            selectors: ListingSelectors::from_config(selectors)?,
        })
    }
}

#[async_trait]
impl BoardScanner for AnnouncementDiscovery {
    async fn discover(&self, cursor: &BoardCursor) -> Discovery {
        match fetch_page(&self.client, &cursor.page_url).await {
            Ok(page) => self.selectors.plan(&page.body, cursor),
            Err(e) => {
                log::warn!("Failed to fetch listing {}: {}", cursor.page_url, e);
                Discovery::unchanged(cursor)
            }
        }
    }
}
