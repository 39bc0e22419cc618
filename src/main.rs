//! Outbreak Watch - Main Daemon
//!
//! A long-running poller that:
//! 1. Fetches outbreak statistics from the configured source
//! 2. Detects whether anything changed since the last fetch
//! 3. Posts per-region updates and a summary to a Telegram channel
//!
//! Usage:
//!   cargo run --release
//!
//! Environment:
//!   TG_CHANNEL_NAME       - channel to post to (required)
//!   TG_BOT_TOKEN          - bot token (required)
//!   OUTBREAK_WATCH_CONFIG - settings file (default: outbreak_watch.toml)
//!   RUST_LOG              - log filter (default: outbreak_watch=info)

use outbreak_watch::config::{Config, SourceConfig};
use outbreak_watch::error::FetchError;
use outbreak_watch::daemon::{Daemon, DaemonConfig};
use outbreak_watch::ingest::scraped::ScrapedSource;
use outbreak_watch::ingest::spreadsheet::SpreadsheetSource;
use outbreak_watch::ingest::{DataSource, HttpFetcher};
use outbreak_watch::notify::TelegramNotifier;
use outbreak_watch::state::FileStateStore;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("outbreak_watch=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_source(source: &SourceConfig) -> Result<Box<dyn DataSource>, FetchError> {
    let fetcher = HttpFetcher::new()?;
    let source: Box<dyn DataSource> = match source {
        SourceConfig::Spreadsheet { url } => {
            Box::new(SpreadsheetSource::with_fetcher(fetcher, url.clone()))
        }
        SourceConfig::Scraped { url, landmark } => Box::new(ScrapedSource::with_fetcher(
            fetcher,
            url.clone(),
            landmark.clone(),
        )),
    };
    Ok(source)
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let settings = config.settings;

    let mut daemon = Daemon::new(
        DaemonConfig {
            poll_interval_minutes: settings.poll_interval_minutes,
            channel: config.credentials.channel,
            title: settings.title,
        },
        build_source(&settings.source)?,
        Box::new(TelegramNotifier::new(config.credentials.bot_token)?),
        Box::new(FileStateStore::new(&settings.state_path)),
    );

    info!(state_path = %settings.state_path, "initializing daemon");
    daemon.initialize()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("received shutdown signal");
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!("failed to set signal handler: {}", e);
    }

    daemon.run(&shutdown);
    info!("Goodbye.");
    Ok(())
}

fn main() {
    println!("🦠 Outbreak Watch");
    println!("=================\n");

    init_logging();

    if let Err(e) = run() {
        error!("startup failed: {}", e);
        std::process::exit(1);
    }
}
