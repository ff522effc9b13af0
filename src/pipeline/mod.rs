//! Pipeline entry points for relay operations.
//!
//! - `run_relay`: one pass over every board: discover, deduplicate,
//!   classify and republish, then advance cursors

mod relay;
mod report;

use std::sync::Arc;

use crate::error::Result;
use crate::models::Config;
use crate::services::publisher::{DryRunPublisher, Publisher};
use crate::services::{
    AnnouncementDiscovery, AnnouncementFetcher, Classifier, DuplicateDetector, OpenAiOracle,
};
use crate::storage::{CursorStore, LedgerStore, LocalStorage, MemoryStorage};
use crate::utils::http::create_async_client;

pub use relay::Relay;
pub use report::{AnnouncementOutcome, AnnouncementRecord, RunReport};

/// Run the relay once against `storage`.
///
/// A dry run reads cursors and recent titles from `storage` but keeps every
/// update in memory and posts nothing. The run report is written either way.
pub async fn run_relay(config: &Config, storage: &LocalStorage, dry_run: bool) -> Result<RunReport> {
    config.validate()?;

    let client = create_async_client(&config.crawler)?;
    let scanner = AnnouncementDiscovery::new(client.clone(), &config.selectors)?;
    let download_dir = storage.root_dir().join(&config.storage.download_dir);
    let source = AnnouncementFetcher::new(client, &config.selectors, &download_dir)?;
    let oracle = OpenAiOracle::from_env(&config.oracle)?;
    let classifier = Classifier::new(config.classifier.clone(), Arc::new(oracle));

    let titles = storage.load_titles().await?;
    log::info!("Loaded {} recent title(s)", titles.len());
    let detector = DuplicateDetector::with_titles(config.dedup.capacity, titles);

    let scratch;
    let cursors: &dyn CursorStore;
    let ledger: &dyn LedgerStore;
    if dry_run {
        scratch = MemoryStorage::new(storage.get_all().await?);
        cursors = &scratch;
        ledger = &scratch;
    } else {
        cursors = storage;
        ledger = storage;
    }

    let mut publisher: Box<dyn Publisher> = if dry_run {
        Box::new(DryRunPublisher::new())
    } else {
        open_publisher(config).await?
    };

    let mut report = RunReport::new(dry_run);
    let result = Relay {
        cursors,
        ledger,
        scanner: &scanner,
        source: &source,
        detector: &detector,
        classifier: &classifier,
        publisher: publisher.as_mut(),
        request_delay: std::time::Duration::from_millis(config.crawler.request_delay_ms),
    }
    .run(&mut report)
    .await;

    if let Err(e) = publisher.close().await {
        log::warn!("Failed to close publisher: {}", e);
    }
    if let Err(e) = &result {
        report.aborted = Some(e.to_string());
    }
    report.finish();
    report.log_summary();

    if let Err(e) = storage.write_report(&report).await {
        log::error!("Failed to write run report: {}", e);
    }

    result.map(|()| report)
}

#[cfg(feature = "webdriver")]
async fn open_publisher(config: &Config) -> Result<Box<dyn Publisher>> {
    use crate::services::publisher::{Credentials, PublishingSession, WebDriverPortal};

    let credentials = Credentials::from_env(&config.publisher)?;
    let portal = WebDriverPortal::connect(&config.publisher, &config.crawler.user_agent).await?;
    let session =
        PublishingSession::start(portal, &credentials, config.publisher.course_url.clone()).await?;
    Ok(Box::new(session))
}

#[cfg(not(feature = "webdriver"))]
async fn open_publisher(_config: &Config) -> Result<Box<dyn Publisher>> {
    Err(crate::error::AppError::config(
        "built without the `webdriver` feature; only dry runs are available",
    ))
}
