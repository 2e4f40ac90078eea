use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgGroup, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use playlist_scraper::browser::{ChromeLauncher, PageLauncher, SnapshotLauncher};
use playlist_scraper::config::{ScraperConfig, TimingConfig};
use playlist_scraper::duration::format_duration;
use playlist_scraper::models::{PlaylistInfo, VideoEntry};
use playlist_scraper::output::ResultWriter;
use playlist_scraper::playlist::{ScrapeReporter, Scraper, Stage};

/// Prints progress lines to stdout
struct ConsoleReporter;

impl ScrapeReporter for ConsoleReporter {
    fn stage(&self, stage: Stage) {
        println!("  -> {}", stage.label());
    }

    fn playlist_found(&self, info: &PlaylistInfo) {
        println!("  Found playlist: {} ({})", info.title, info.channel);
    }

    fn item_kept(&self, index: usize, entry: &VideoEntry) {
        println!(
            "  [{:>3}] {} ({})",
            index + 1,
            entry.title,
            entry.duration.as_deref().unwrap_or("?")
        );
    }

    fn finished(&self, kept: usize, total: usize) {
        println!("  Kept {} of {} playlist items", kept, total);
    }
}

fn cli() -> Command {
    Command::new("scrape")
        .version(env!("CARGO_PKG_VERSION"))
        .about("YouTube Playlist Scraper")
        .arg(
            Arg::new("course_name")
                .value_name("COURSE_NAME")
                .help("Name of the course to search for")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Directory to save JSON output (default: output)"),
        )
        .arg(
            Arg::new("headless")
                .long("headless")
                .help("Run browser in headless mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("headed")
                .long("headed")
                .help("Run browser with a visible window")
                .action(ArgAction::SetTrue),
        )
        .group(ArgGroup::new("window").args(["headless", "headed"]))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: playlist-scraper.toml if present)"),
        )
        .arg(
            Arg::new("capture-dir")
                .long("capture-dir")
                .value_name("DIR")
                .help("Save the search and playlist pages for offline replay"),
        )
        .arg(
            Arg::new("replay-dir")
                .long("replay-dir")
                .value_name("DIR")
                .help("Replay pages saved with --capture-dir instead of launching a browser")
                .conflicts_with("capture-dir"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
}

#[tokio::main]
async fn main() {
    let code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            println!("\nError: {:#}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run() -> Result<()> {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose");

    // Initialize logging
    let default_filter = if verbose { "playlist_scraper=debug,info" } else { "playlist_scraper=info,warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    if verbose {
        info!("Verbose logging enabled");
    }

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ScraperConfig::from_file(path)?,
        None => ScraperConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            ScraperConfig::default()
        }),
    };

    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output.dir = PathBuf::from(dir);
    }
    if matches.get_flag("headless") {
        config.browser.headless = true;
    }
    if matches.get_flag("headed") {
        config.browser.headless = false;
    }

    let replay_dir = matches.get_one::<String>("replay-dir").map(PathBuf::from);
    let capture_dir = matches.get_one::<String>("capture-dir").map(PathBuf::from);

    let launcher: Arc<dyn PageLauncher> = match &replay_dir {
        Some(dir) => {
            config.timing = TimingConfig {
                max_scroll_attempts: config.timing.max_scroll_attempts,
                scroll_every: config.timing.scroll_every,
                ..TimingConfig::instant()
            };
            let launcher = SnapshotLauncher::from_dir(dir)
                .with_context(|| format!("Failed to read captured pages from {}", dir.display()))?;
            Arc::new(launcher)
        }
        None => Arc::new(ChromeLauncher::new(config.browser.clone())),
    };

    config.validate()?;

    let course_name = matches
        .get_one::<String>("course_name")
        .context("course name is required")?
        .clone();

    println!("\nSearching for: {}", course_name);
    println!("Output directory: {}", config.output.dir.display());
    if let Some(dir) = &replay_dir {
        println!("Replaying captured pages from: {}", dir.display());
    }
    println!("Starting scraper...\n");

    let writer = ResultWriter::new(config.output.dir.clone(), config.output.file_prefix.clone());
    let scraper = Scraper::new(Arc::new(config), launcher)
        .with_reporter(Arc::new(ConsoleReporter))
        .with_capture_dir(capture_dir);

    let start_time = std::time::Instant::now();
    let result = scraper.scrape(course_name).await?;

    println!("\nPlaylist Information:");
    println!("{}", serde_json::to_string_pretty(&result)?);
    println!(
        "\n{} videos, total runtime {}",
        result.videos.len(),
        format_duration(result.total_duration_seconds())
    );

    let output_file = writer.write(&result).await?;
    println!("\nData saved to: {}", output_file.display());

    info!("🎉 Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}
