//! Notice Relay CLI
//!
//! Local execution entry point, meant to be run periodically (cron, systemd timer).

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use notice_relay::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    services::{
        AnnouncementFetcher, AnnouncementSource, Classifier, DetailSelectors, ListingSelectors,
        OpenAiOracle,
    },
    storage::{CursorStore, LocalStorage},
    utils::http,
};

/// notice-relay - Campus Notice Relay
#[derive(Parser, Debug)]
#[command(
    name = "notice-relay",
    version,
    about = "Relays new campus notices into course portal boards"
)]
struct Cli {
    /// Path to storage directory containing config and state files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan every board once and republish new announcements
    Run {
        /// Classify but do not post; cursors and titles are not saved
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration and list boards
    Validate,

    /// Show stored board cursors
    Cursors,

    /// Classify a single announcement without publishing it
    Classify {
        /// Detail page URL
        url: String,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env loaded: {}", e);
    }

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let storage = LocalStorage::with_files(&cli.storage_dir, config.storage.clone());

    log::info!("Using storage directory {}", cli.storage_dir.display());

    match cli.command {
        Command::Run { dry_run } => {
            let report = pipeline::run_relay(&config, &storage, dry_run).await?;
            log::info!(
                "Relay complete: {} published out of {} announcement(s)",
                report.published(),
                report.announcements.len()
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            ListingSelectors::from_config(&config.selectors)?;
            DetailSelectors::from_config(&config.selectors)?;
            log::info!("✓ Config OK (includes selectors and classifier rules)");

            let boards = storage.get_all().await?;
            if boards.is_empty() {
                return Err(AppError::config(format!(
                    "no boards configured in {}",
                    cli.storage_dir.join(&config.storage.cursor_file).display()
                )));
            }
            log::info!("✓ {} board(s) configured", boards.len());
            for board in &boards {
                log::info!("  {}", board.page_url);
            }

            log::info!("All validations passed!");
        }

        Command::Cursors => {
            let boards = storage.get_all().await?;
            for board in &boards {
                log::info!("#{:<8} {}", board.last_seen_number, board.page_url);
            }
            log::info!("{} board(s)", boards.len());
        }

        Command::Classify { url } => {
            let client = http::create_async_client(&config.crawler)?;
            let download_dir = cli.storage_dir.join(&config.storage.download_dir);
            let fetcher = AnnouncementFetcher::new(client, &config.selectors, &download_dir)?;

            let announcement = fetcher
                .fetch_partial(&url)
                .await
                .ok_or_else(|| AppError::fetch(&url, "announcement could not be read"))?;

            let oracle = OpenAiOracle::from_env(&config.oracle)?;
            let classifier = Classifier::new(config.classifier.clone(), Arc::new(oracle));
            let category = classifier
                .classify(announcement.title(), announcement.content_text())
                .await?;

            log::info!("{}", announcement.title());
            log::info!(
                "→ {} ({})",
                category,
                if category.is_publishable() {
                    "would be published"
                } else {
                    "would be skipped"
                }
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
