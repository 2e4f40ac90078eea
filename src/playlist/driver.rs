//! The page-interaction sequence for one course lookup

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::extract::{absolute_url, normalize_text, ItemExtractor, ItemOutcome};
use super::reporter::{ScrapeReporter, Stage};
use super::scroll::{scroll_until_stable, ScrollOutcome};
use super::selectors::SelectorChain;
use crate::browser::snapshot::{PLAYLIST_SNAPSHOT, SEARCH_SNAPSHOT};
use crate::browser::{BrowserPage, ElementHandle};
use crate::config::ScraperConfig;
use crate::error::{BrowserError, Result, ScrapeError};
use crate::models::{PlaylistInfo, ScrapeResult};
use crate::search::SearchQuery;

/// Channel name used when the playlist page shows none
pub const UNKNOWN_CHANNEL: &str = "Unknown Channel";

/// Drives one browser page through a single playlist scrape
pub struct PlaylistScraper<'a> {
    config: &'a ScraperConfig,
    reporter: &'a dyn ScrapeReporter,
    capture_dir: Option<&'a Path>,
}

impl<'a> PlaylistScraper<'a> {
    pub fn new(config: &'a ScraperConfig, reporter: &'a dyn ScrapeReporter) -> Self {
        Self {
            config,
            reporter,
            capture_dir: None,
        }
    }

    /// Save the search and playlist documents under `dir` during the run
    pub fn with_capture_dir(mut self, dir: Option<&'a Path>) -> Self {
        self.capture_dir = dir;
        self
    }

    /// Run the full sequence. The page is closed on every exit path.
    #[tracing::instrument(skip_all, fields(course = query.course_name()))]
    pub fn run(&self, page: &mut dyn BrowserPage, query: &SearchQuery) -> Result<ScrapeResult> {
        let result = self.drive(page, query);
        if let Err(e) = page.close() {
            warn!("Failed to close browser page: {}", e);
        }
        result
    }

    fn drive(&self, page: &mut dyn BrowserPage, query: &SearchQuery) -> Result<ScrapeResult> {
        let timing = &self.config.timing;
        let selectors = &self.config.selectors;

        let search_url = query.search_url(&self.config.search);
        let mut result = ScrapeResult::new(search_url.clone());

        self.reporter.stage(Stage::Navigating);
        info!("🔍 Searching: {}", search_url);
        page.navigate(&search_url)?;
        page.wait_for_load()?;
        std::thread::sleep(timing.settle_delay());
        self.capture(page, SEARCH_SNAPSHOT);

        self.reporter.stage(Stage::LocatingPlaylist);
        let candidates = SelectorChain::new(&selectors.playlist_candidates);
        let Some((playlist_link, matched)) = candidates.first_visible(page, timing.selector_timeout())? else {
            return Err(ScrapeError::NoPlaylistFound {
                tried: selectors.playlist_candidates.clone(),
            });
        };
        debug!("Playlist link located with '{}'", matched);

        let href = self.validated_href(page, playlist_link)?;
        let title = self.playlist_title(page, playlist_link);

        self.reporter.stage(Stage::OpeningPlaylist);
        page.click(playlist_link)?;
        page.wait_for_load()?;

        let channel = self.playlist_channel(page);
        result.playlist_info = PlaylistInfo {
            title,
            channel,
            url: absolute_url(&self.config.search.site_origin, &href),
        };
        self.reporter.playlist_found(&result.playlist_info);

        self.reporter.stage(Stage::WaitingForList);
        page.wait_for_selector(&selectors.video_item, timing.list_timeout())
            .map_err(|e| match e {
                BrowserError::Timeout { selector, timeout } => {
                    ScrapeError::PlaylistNotLoaded { selector, timeout }
                }
                other => ScrapeError::Browser(other),
            })?;

        self.reporter.stage(Stage::Scrolling);
        match scroll_until_stable(page, timing)? {
            ScrollOutcome::Stable { scrolls, height } => {
                info!("📜 Page height stable at {} after {} scrolls", height, scrolls)
            }
            ScrollOutcome::CapReached { scrolls, .. } => {
                warn!("Continuing with the items loaded after {} scrolls", scrolls)
            }
        }
        self.capture(page, PLAYLIST_SNAPSHOT);

        self.reporter.stage(Stage::Extracting);
        let items = page.query_all(None, &selectors.video_item)?;
        info!("🎬 Found {} items in playlist", items.len());

        let extractor = ItemExtractor::new(
            selectors,
            &self.config.filter,
            &self.config.search.site_origin,
            &result.playlist_info.channel,
        );

        let mut videos = Vec::new();
        for (index, &item) in items.iter().enumerate() {
            match extractor.extract(page, item) {
                ItemOutcome::Extracted(entry) => {
                    self.reporter.item_kept(index, &entry);
                    videos.push(entry);
                }
                ItemOutcome::Skipped(reason) => {
                    debug!("Skipping item {}: {}", index + 1, reason);
                    self.reporter.item_skipped(index, &reason.to_string());
                }
            }

            let every = timing.scroll_every;
            if every > 0 && (index + 1) % every == 0 && index + 1 < items.len() {
                debug!("Bringing item {} into view", index + 1);
                if let Err(e) = page.scroll_into_view(item) {
                    warn!("Could not scroll item {} into view: {}", index + 1, e);
                }
                std::thread::sleep(timing.item_pause());
            }
        }

        result.videos = videos;
        self.reporter.finished(result.videos.len(), items.len());
        Ok(result)
    }

    fn validated_href(&self, page: &mut dyn BrowserPage, link: ElementHandle) -> Result<String> {
        let href = page.attribute(link, "href")?;
        let markers = &self.config.selectors.playlist_link_markers;

        match href {
            Some(href) if markers.iter().any(|marker| href.contains(marker.as_str())) => Ok(href),
            href => Err(ScrapeError::InvalidPlaylistLink { href }),
        }
    }

    /// Dedicated title element first, then the link's own text
    fn playlist_title(&self, page: &mut dyn BrowserPage, link: ElementHandle) -> String {
        let chain = SelectorChain::new(&self.config.selectors.playlist_title);
        match chain.first_text(page, None) {
            Ok(Some(title)) => return title,
            Ok(None) => warn!(
                "Playlist title not found with {:?}; using link text",
                chain.selectors()
            ),
            Err(e) => warn!("Could not read playlist title: {}; using link text", e),
        }
        match page.text_content(link) {
            Ok(text) => normalize_text(&text),
            Err(e) => {
                warn!("Could not read playlist link text: {}", e);
                String::new()
            }
        }
    }

    fn playlist_channel(&self, page: &mut dyn BrowserPage) -> String {
        let chain = SelectorChain::new(&self.config.selectors.playlist_channel);
        match chain.first_text(page, None) {
            Ok(Some(channel)) => channel,
            Ok(None) => {
                warn!("Channel name not found with {:?}", chain.selectors());
                UNKNOWN_CHANNEL.to_string()
            }
            Err(e) => {
                warn!("Could not get channel name: {}", e);
                UNKNOWN_CHANNEL.to_string()
            }
        }
    }

    fn capture(&self, page: &mut dyn BrowserPage, name: &str) {
        let Some(dir) = self.capture_dir else {
            return;
        };
        let path: PathBuf = dir.join(name);
        let written = page
            .content()
            .map_err(|e| e.to_string())
            .and_then(|html| {
                std::fs::create_dir_all(dir)
                    .and_then(|_| std::fs::write(&path, html))
                    .map_err(|e| e.to_string())
            });
        match written {
            Ok(()) => info!("📸 Captured {}", path.display()),
            Err(e) => warn!("Failed to capture {}: {}", path.display(), e),
        }
    }
}
