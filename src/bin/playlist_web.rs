use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use playlist_scraper::browser::{ChromeLauncher, PageLauncher, SnapshotLauncher};
use playlist_scraper::config::{ScraperConfig, TimingConfig};
use playlist_scraper::playlist::Scraper;
use playlist_scraper::web::WebServer;

#[derive(Parser)]
#[command(name = "playlist-web")]
#[command(about = "Interactive YouTube playlist scraper")]
struct Cli {
    /// Configuration file (default: playlist-scraper.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Serve pages saved with `scrape --capture-dir` instead of launching a browser
    #[arg(long)]
    replay_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "playlist_scraper=debug,tower_http=debug,info"
    } else {
        "playlist_scraper=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            ScraperConfig::default()
        }),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let launcher: Arc<dyn PageLauncher> = match &cli.replay_dir {
        Some(dir) => {
            info!("🗂️  Replaying captured pages from {}", dir.display());
            config.timing = TimingConfig {
                max_scroll_attempts: config.timing.max_scroll_attempts,
                scroll_every: config.timing.scroll_every,
                ..TimingConfig::instant()
            };
            Arc::new(
                SnapshotLauncher::from_dir(dir)
                    .with_context(|| format!("Failed to read captured pages from {}", dir.display()))?,
            )
        }
        None => Arc::new(ChromeLauncher::new(config.browser.clone())),
    };

    config.validate()?;
    info!("{}", config.summary());

    let scraper = Scraper::new(Arc::new(config), launcher);
    WebServer::new(scraper).start().await
}
