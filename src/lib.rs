//! Playlist Scraper
//!
//! Finds the first playlist a YouTube search returns for a course name, loads
//! every item by scrolling, keeps the items that are at least a minute long and
//! writes the result as JSON.

pub mod browser;
pub mod config;
pub mod duration;
pub mod error;
pub mod models;
pub mod output;
pub mod playlist;
pub mod search;

#[cfg(feature = "web")]
pub mod web;

// Re-export main types for easy access
pub use crate::browser::{BrowserPage, ChromeLauncher, PageLauncher, SnapshotLauncher, SnapshotPage};
pub use crate::config::{ConfigBuilder, ScraperConfig};
pub use crate::duration::{format_duration, parse_duration};
pub use crate::error::{BrowserError, Result, ScrapeError};
pub use crate::models::{PlaylistInfo, ScrapeMetadata, ScrapeResult, VideoEntry};
pub use crate::output::ResultWriter;
pub use crate::playlist::{PlaylistScraper, ScrapeReporter, Scraper, TracingReporter};
pub use crate::search::{build_search_url, SearchQuery};
