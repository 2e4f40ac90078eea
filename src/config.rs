use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ScrapeError};

/// Configuration for the playlist scraper
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScraperConfig {
    /// Search URL composition
    pub search: SearchConfig,

    /// Browser launch settings
    pub browser: BrowserConfig,

    /// Waits, pauses and scroll bounds
    pub timing: TimingConfig,

    /// Item filtering
    pub filter: FilterConfig,

    /// Selector fallback chains
    pub selectors: SelectorConfig,

    /// Output file settings
    pub output: OutputConfig,

    /// Interactive server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search results endpoint
    pub base_url: String,

    /// Phrase appended to the course name to bias results towards English content
    pub language_hint: String,

    /// Opaque `sp` parameter restricting results to playlists (already percent-encoded)
    pub playlist_filter: String,

    /// Origin used to absolutise relative links
    pub site_origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,

    pub window_width: u32,

    pub window_height: u32,

    /// Seconds the DevTools connection may stay silent before the browser is dropped
    pub idle_timeout_secs: u64,

    /// Seconds to wait for navigation and readiness signals
    pub load_timeout_secs: u64,

    /// Explicit Chrome/Chromium binary (auto-detected when unset)
    pub chrome_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after the search page reports ready
    pub settle_delay_ms: u64,

    /// Bounded wait per playlist selector candidate
    pub selector_timeout_ms: u64,

    /// Bounded wait for the playlist video list
    pub list_timeout_ms: u64,

    /// Pause after each scroll to the bottom
    pub scroll_pause_ms: u64,

    /// Pause after scrolling back to the top
    pub top_pause_ms: u64,

    /// Pause after bringing an item into view
    pub item_pause_ms: u64,

    /// Bring every n-th item into view during extraction
    pub scroll_every: usize,

    /// Upper bound on scroll-to-bottom iterations
    pub max_scroll_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Items shorter than this are dropped
    pub min_duration_secs: u64,
}

/// Ordered selector candidates, most specific first.
///
/// Kept as data so a drifting site can be followed from the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub playlist_candidates: Vec<String>,
    pub playlist_title: Vec<String>,
    pub playlist_channel: Vec<String>,
    pub video_item: String,
    pub item_title: Vec<String>,
    pub item_channel: Vec<String>,
    pub item_thumbnail: Vec<String>,
    pub item_duration: Vec<String>,
    pub item_metadata: Vec<String>,

    /// Substrings that identify a playlist link target
    pub playlist_link_markers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for result files
    pub dir: PathBuf,

    /// File name prefix for command-line runs
    pub file_prefix: String,

    /// File name prefix for interactive downloads
    pub download_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// How many finished results stay downloadable
    pub max_kept_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com/results".to_string(),
            language_hint: "in English".to_string(),
            playlist_filter: "EgIQAw%253D%253D".to_string(),
            site_origin: "https://www.youtube.com".to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 1024,
            idle_timeout_secs: 60,
            load_timeout_secs: 30,
            chrome_path: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 3000,
            selector_timeout_ms: 5000,
            list_timeout_ms: 10000,
            scroll_pause_ms: 2000,
            top_pause_ms: 1000,
            item_pause_ms: 1000,
            scroll_every: 6,
            max_scroll_attempts: 200,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 60,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            playlist_candidates: vec![
                "ytd-item-section-renderer ytd-lockup-view-model a.yt-lockup-metadata-view-model-wiz__title".to_string(),
                "ytd-item-section-renderer a#video-title".to_string(),
                r#"ytd-item-section-renderer a[href*="/playlist?list="]"#.to_string(),
                r#"ytd-item-section-renderer a[href*="&list="]"#.to_string(),
            ],
            playlist_title: vec![
                "#contents > yt-lockup-view-model:nth-child(2) > div > div > yt-lockup-metadata-view-model > div.yt-lockup-metadata-view-model-wiz__text-container > h3".to_string(),
            ],
            playlist_channel: vec![
                "ytd-channel-name yt-formatted-string a".to_string(),
                "yt-page-header-view-model yt-content-metadata-view-model a".to_string(),
            ],
            video_item: "#contents ytd-playlist-video-renderer".to_string(),
            item_title: vec!["#video-title".to_string()],
            item_channel: vec!["#channel-name #text".to_string()],
            item_thumbnail: vec!["ytd-thumbnail img".to_string()],
            item_duration: vec![
                "ytd-thumbnail-overlay-time-status-renderer .badge-shape-wiz__text".to_string(),
                "ytd-thumbnail-overlay-time-status-renderer span#text".to_string(),
            ],
            item_metadata: vec!["#metadata-line yt-formatted-string".to_string()],
            playlist_link_markers: vec!["/playlist?list=".to_string(), "&list=".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            file_prefix: "youtube_data".to_string(),
            download_prefix: "youtube_playlist".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_kept_results: 16,
        }
    }
}

impl TimingConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_millis(self.selector_timeout_ms)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_millis(self.list_timeout_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn top_pause(&self) -> Duration {
        Duration::from_millis(self.top_pause_ms)
    }

    pub fn item_pause(&self) -> Duration {
        Duration::from_millis(self.item_pause_ms)
    }

    /// All pauses and waits collapsed to zero, for replaying captured pages
    pub fn instant() -> Self {
        Self {
            settle_delay_ms: 0,
            selector_timeout_ms: 0,
            list_timeout_ms: 0,
            scroll_pause_ms: 0,
            top_pause_ms: 0,
            item_pause_ms: 0,
            ..Self::default()
        }
    }
}

impl ScraperConfig {
    /// Load configuration from the first readable config file, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "playlist-scraper.toml",
            "config/playlist-scraper.toml",
        ];

        for path in &config_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Self::from_env(Self::default())
    }

    /// Load a specific config file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str =
            std::fs::read_to_string(path).map_err(|e| ScrapeError::io(path, e))?;
        let config: Self = toml::from_str(&config_str)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Self::from_env(config)
    }

    /// Override fields from `PLAYLIST_SCRAPER_*` environment variables
    pub fn from_env(mut config: Self) -> Result<Self> {
        if let Ok(output_dir) = std::env::var("PLAYLIST_SCRAPER_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(output_dir);
        }

        if let Ok(headless) = std::env::var("PLAYLIST_SCRAPER_HEADLESS") {
            config.browser.headless = parse_bool(&headless).ok_or_else(|| {
                ScrapeError::Config(format!("PLAYLIST_SCRAPER_HEADLESS: expected a boolean, got '{}'", headless))
            })?;
        }

        if let Ok(chrome_path) = std::env::var("PLAYLIST_SCRAPER_CHROME_PATH") {
            config.browser.chrome_path = Some(PathBuf::from(chrome_path));
        }

        if let Ok(port) = std::env::var("PLAYLIST_SCRAPER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| ScrapeError::Config(format!("PLAYLIST_SCRAPER_PORT: {}", e)))?;
        }

        if let Ok(max_scrolls) = std::env::var("PLAYLIST_SCRAPER_MAX_SCROLLS") {
            config.timing.max_scroll_attempts = max_scrolls
                .parse()
                .map_err(|e| ScrapeError::Config(format!("PLAYLIST_SCRAPER_MAX_SCROLLS: {}", e)))?;
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| ScrapeError::Config(e.to_string()))?;
        std::fs::write(path, config_str).map_err(|e| ScrapeError::io(path, e))?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.selectors.playlist_candidates.is_empty() {
            return Err(ScrapeError::Config(
                "selectors.playlist_candidates must list at least one selector".to_string(),
            ));
        }

        if self.selectors.video_item.trim().is_empty() {
            return Err(ScrapeError::Config("selectors.video_item must not be empty".to_string()));
        }

        if self.selectors.item_title.is_empty() || self.selectors.item_duration.is_empty() {
            return Err(ScrapeError::Config(
                "selectors.item_title and selectors.item_duration must not be empty".to_string(),
            ));
        }

        if self.selectors.playlist_link_markers.is_empty() {
            return Err(ScrapeError::Config(
                "selectors.playlist_link_markers must not be empty".to_string(),
            ));
        }

        if self.timing.max_scroll_attempts == 0 {
            return Err(ScrapeError::Config("timing.max_scroll_attempts must be greater than 0".to_string()));
        }

        if url::Url::parse(&self.search.base_url).is_err() {
            return Err(ScrapeError::Config(format!(
                "search.base_url is not a valid URL: {}",
                self.search.base_url
            )));
        }

        if url::Url::parse(&self.search.site_origin).is_err() {
            return Err(ScrapeError::Config(format!(
                "search.site_origin is not a valid URL: {}",
                self.search.site_origin
            )));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Playlist Scraper Configuration:\n\
            - Search endpoint: {}\n\
            - Language hint: {}\n\
            - Headless: {}\n\
            - Minimum duration: {}s\n\
            - Max scroll attempts: {}\n\
            - Output directory: {}",
            self.search.base_url,
            self.search.language_hint,
            self.browser.headless,
            self.filter.min_duration_secs,
            self.timing.max_scroll_attempts,
            self.output.dir.display()
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: ScraperConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ScraperConfig::default(),
        }
    }

    pub fn from_config(config: ScraperConfig) -> Self {
        Self { config }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.dir = dir.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.browser.headless = headless;
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.config.timing = timing;
        self
    }

    pub fn with_max_scroll_attempts(mut self, attempts: usize) -> Self {
        self.config.timing.max_scroll_attempts = attempts;
        self
    }

    pub fn with_min_duration(mut self, seconds: u64) -> Self {
        self.config.filter.min_duration_secs = seconds;
        self
    }

    pub fn build(self) -> ScraperConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ScraperConfig::default();
        assert_eq!(config.timing.selector_timeout(), Duration::from_secs(5));
        assert_eq!(config.timing.list_timeout(), Duration::from_secs(10));
        assert_eq!(config.filter.min_duration_secs, 60);
        assert_eq!(config.selectors.playlist_candidates.len(), 4);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_output_dir("/tmp/out")
            .with_headless(false)
            .with_timing(TimingConfig::instant())
            .with_max_scroll_attempts(3)
            .build();

        assert_eq!(config.output.dir, PathBuf::from("/tmp/out"));
        assert!(!config.browser.headless);
        assert_eq!(config.timing.scroll_pause(), Duration::ZERO);
        assert_eq!(config.timing.max_scroll_attempts, 3);
        assert_eq!(config.timing.scroll_every, 6);
    }

    #[test]
    fn test_config_validation() {
        assert!(ScraperConfig::default().validate().is_ok());

        let mut config = ScraperConfig::default();
        config.selectors.playlist_candidates.clear();
        assert!(matches!(config.validate(), Err(ScrapeError::Config(_))));

        let config = ConfigBuilder::new().with_max_scroll_attempts(0).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ScraperConfig = toml::from_str(
            r#"
            [timing]
            scroll_pause_ms = 500

            [selectors]
            video_item = "ytd-playlist-video-renderer"
            "#,
        )
        .unwrap();

        assert_eq!(config.timing.scroll_pause_ms, 500);
        assert_eq!(config.timing.settle_delay_ms, 3000);
        assert_eq!(config.selectors.video_item, "ytd-playlist-video-renderer");
        assert_eq!(config.selectors.item_title, vec!["#video-title".to_string()]);
        assert_eq!(config.search.language_hint, "in English");
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("playlist-scraper.toml");

        let config = ConfigBuilder::new().with_min_duration(120).build();
        config.save(&path).unwrap();

        let loaded: ScraperConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.filter.min_duration_secs, 120);
        assert_eq!(loaded.selectors.item_duration, config.selectors.item_duration);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
