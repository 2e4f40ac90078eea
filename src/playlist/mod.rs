//! Playlist scraping: the page driver and its helpers

pub mod driver;
pub mod extract;
pub mod reporter;
pub mod scroll;
pub mod selectors;

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::browser::PageLauncher;
use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::models::ScrapeResult;
use crate::search::SearchQuery;

pub use driver::{PlaylistScraper, UNKNOWN_CHANNEL};
pub use extract::{ItemOutcome, SkipReason};
pub use reporter::{RecordingReporter, ReportEvent, ScrapeReporter, Stage, TracingReporter};
pub use scroll::ScrollOutcome;
pub use selectors::SelectorChain;

/// Launches one page per course lookup and runs the scrape on it
#[derive(Clone)]
pub struct Scraper {
    config: Arc<ScraperConfig>,
    launcher: Arc<dyn PageLauncher>,
    reporter: Arc<dyn ScrapeReporter>,
    capture_dir: Option<PathBuf>,
}

impl Scraper {
    pub fn new(config: Arc<ScraperConfig>, launcher: Arc<dyn PageLauncher>) -> Self {
        Self {
            config,
            launcher,
            reporter: Arc::new(TracingReporter),
            capture_dir: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ScrapeReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_capture_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.capture_dir = dir;
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Scrape the first playlist found for `course_name`, blocking the current thread
    pub fn scrape_blocking(&self, course_name: &str) -> Result<ScrapeResult> {
        let query = SearchQuery::new(course_name)?;
        info!("🚀 Starting scrape for '{}'", query.course_name());

        let mut page = self.launcher.launch()?;
        PlaylistScraper::new(&self.config, self.reporter.as_ref())
            .with_capture_dir(self.capture_dir.as_deref())
            .run(page.as_mut(), &query)
    }

    /// Run [`Scraper::scrape_blocking`] on the blocking thread pool
    pub async fn scrape(&self, course_name: String) -> Result<ScrapeResult> {
        self.scrape_holding(course_name, ()).await
    }

    /// Like [`Scraper::scrape`], but `guard` is dropped only when the browser
    /// session ends, even if the returned future is dropped first
    pub async fn scrape_holding<G>(&self, course_name: String, guard: G) -> Result<ScrapeResult>
    where
        G: Send + 'static,
    {
        let scraper = self.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            scraper.scrape_blocking(&course_name)
        })
        .await
        .map_err(|e| ScrapeError::Task(e.to_string()))?
    }
}
