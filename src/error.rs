//! Error types for the playlist scraper

use std::path::PathBuf;
use std::time::Duration;

/// Result type for browser operations
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type for scrape runs
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Failures reported by a browser backend
#[derive(thiserror::Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Page did not finish loading within {0:?}")]
    LoadTimeout(Duration),

    #[error("Timed out after {timeout:?} waiting for selector '{selector}'")]
    Timeout { selector: String, timeout: Duration },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Element handle {0} is no longer attached to the page")]
    StaleElement(u32),

    #[error("Browser session is closed")]
    Closed,

    #[error("Browser protocol error: {0}")]
    Protocol(String),
}

/// Failures that abort a scrape run
#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("Course name must not be empty")]
    EmptyCourseName,

    #[error("No playlist found (tried selectors: {})", .tried.join(" | "))]
    NoPlaylistFound { tried: Vec<String> },

    #[error("Invalid playlist link: {href:?}")]
    InvalidPlaylistLink { href: Option<String> },

    #[error("Playlist did not load: '{selector}' not present after {timeout:?}")]
    PlaylistNotLoaded { selector: String, timeout: Duration },

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scrape task failed: {0}")]
    Task(String),
}

impl ScrapeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_playlist_message_lists_selectors() {
        let err = ScrapeError::NoPlaylistFound {
            tried: vec!["a#video-title".to_string(), "a[href*=\"&list=\"]".to_string()],
        };
        let message = err.to_string();
        assert!(message.starts_with("No playlist found"));
        assert!(message.contains("a#video-title | a[href*=\"&list=\"]"));
    }

    #[test]
    fn test_timeout_names_selector() {
        let err = ScrapeError::from(BrowserError::Timeout {
            selector: "#contents".to_string(),
            timeout: Duration::from_secs(5),
        });
        assert!(err.to_string().contains("'#contents'"));
    }
}
