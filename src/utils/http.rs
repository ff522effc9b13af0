// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// A fetched page together with the URL it finally resolved to.
#[derive(Debug)]
pub struct FetchedPage {
    pub final_url: url::Url,
    pub body: String,
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page, treating non-success statuses as errors.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<FetchedPage> {
    let response = client.get(url).send().await?.error_for_status()?;
    let final_url = response.url().clone();
    let body = response.text().await?;
    Ok(FetchedPage { final_url, body })
}

/// Download a binary resource.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
