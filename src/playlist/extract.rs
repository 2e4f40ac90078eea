//! Per-item field extraction with per-field fallbacks

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

use super::selectors::SelectorChain;
use crate::browser::{BrowserPage, ElementHandle};
use crate::config::{FilterConfig, SelectorConfig};
use crate::duration::parse_duration;
use crate::error::BrowserResult;
use crate::models::VideoEntry;

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Trim and collapse internal whitespace runs to single spaces
pub fn normalize_text(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw.trim(), " ").into_owned()
}

/// Resolve `href` against the site origin
pub fn absolute_url(origin: &str, href: &str) -> String {
    Url::parse(origin)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| format!("{}{}", origin.trim_end_matches('/'), href))
}

/// Why an item was left out of the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingTitle,
    MissingDuration,
    TooShort { duration: String, seconds: u64 },
    Failed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingTitle => write!(f, "no title link"),
            SkipReason::MissingDuration => write!(f, "no readable duration badge"),
            SkipReason::TooShort { duration, seconds } => {
                write!(f, "duration {} ({}s) below threshold", duration, seconds)
            }
            SkipReason::Failed(message) => write!(f, "extraction failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Extracted(VideoEntry),
    Skipped(SkipReason),
}

/// Extracts one playlist item at a time
pub struct ItemExtractor<'a> {
    selectors: &'a SelectorConfig,
    filter: &'a FilterConfig,
    site_origin: &'a str,
    playlist_channel: &'a str,
}

impl<'a> ItemExtractor<'a> {
    pub fn new(
        selectors: &'a SelectorConfig,
        filter: &'a FilterConfig,
        site_origin: &'a str,
        playlist_channel: &'a str,
    ) -> Self {
        Self {
            selectors,
            filter,
            site_origin,
            playlist_channel,
        }
    }

    /// Extract one item; a browser failure inside the item becomes a skip
    pub fn extract(&self, page: &mut dyn BrowserPage, item: ElementHandle) -> ItemOutcome {
        match self.try_extract(page, item) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to extract item {}: {}", item, e);
                ItemOutcome::Skipped(SkipReason::Failed(e.to_string()))
            }
        }
    }

    fn try_extract(&self, page: &mut dyn BrowserPage, item: ElementHandle) -> BrowserResult<ItemOutcome> {
        let scope = Some(item);

        let Some((title_element, _)) = SelectorChain::new(&self.selectors.item_title).first_element(page, scope)? else {
            return Ok(ItemOutcome::Skipped(SkipReason::MissingTitle));
        };
        let title = normalize_text(&page.text_content(title_element)?);
        let Some(href) = page.attribute(title_element, "href")?.filter(|h| !h.trim().is_empty()) else {
            return Ok(ItemOutcome::Skipped(SkipReason::MissingTitle));
        };

        let channel = match SelectorChain::new(&self.selectors.item_channel).first_text(page, scope)? {
            Some(channel) => channel,
            None => self.playlist_channel.to_string(),
        };

        let thumbnail = SelectorChain::new(&self.selectors.item_thumbnail).first_attribute(page, scope, "src")?;

        let Some(duration) = SelectorChain::new(&self.selectors.item_duration).first_text(page, scope)? else {
            return Ok(ItemOutcome::Skipped(SkipReason::MissingDuration));
        };
        let seconds = parse_duration(&duration);
        if seconds < self.filter.min_duration_secs {
            return Ok(ItemOutcome::Skipped(SkipReason::TooShort { duration, seconds }));
        }

        let metadata = SelectorChain::new(&self.selectors.item_metadata).all_texts(page, scope)?;
        let (views, upload_time) = match metadata.as_slice() {
            [views, upload_time, ..] => (Some(views.clone()), Some(upload_time.clone())),
            _ => (None, None),
        };

        Ok(ItemOutcome::Extracted(VideoEntry {
            title,
            url: absolute_url(self.site_origin, href.trim()),
            channel,
            thumbnail,
            duration: Some(duration),
            views,
            upload_time,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::SnapshotPage;

    fn item_html(body: &str) -> String {
        format!(
            r#"<html><body><div id="contents"><ytd-playlist-video-renderer>{}</ytd-playlist-video-renderer></div></body></html>"#,
            body
        )
    }

    fn extract(body: &str) -> ItemOutcome {
        let selectors = SelectorConfig::default();
        let filter = FilterConfig::default();
        let mut page = SnapshotPage::new(item_html(body), "");
        page.navigate("https://example.test").unwrap();
        let item = page.query_first(None, &selectors.video_item).unwrap().unwrap();

        ItemExtractor::new(&selectors, &filter, "https://www.youtube.com", "Playlist Channel")
            .extract(&mut page, item)
    }

    const TITLE: &str = r#"<a id="video-title" href="/watch?v=abc&amp;list=PL1">
        Intro   to
        Ownership
    </a>"#;

    const DURATION: &str = r#"<ytd-thumbnail-overlay-time-status-renderer>
        <div class="badge-shape-wiz__text"> 12:34 </div>
    </ytd-thumbnail-overlay-time-status-renderer>"#;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  a\n\t b  c "), "a b c");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://www.youtube.com", "/playlist?list=PL1"),
            "https://www.youtube.com/playlist?list=PL1"
        );
        assert_eq!(
            absolute_url("https://www.youtube.com", "https://youtu.be/x"),
            "https://youtu.be/x"
        );
    }

    #[test]
    fn test_full_item() {
        let body = format!(
            r#"{TITLE}{DURATION}
            <ytd-thumbnail><img src="https://i.ytimg.com/vi/abc/hq.jpg"></ytd-thumbnail>
            <div id="channel-name"><span id="text">Item Channel</span></div>
            <div id="metadata-line"><yt-formatted-string>1.2M views</yt-formatted-string><yt-formatted-string>2 years ago</yt-formatted-string></div>"#
        );
        let ItemOutcome::Extracted(entry) = extract(&body) else {
            panic!("item should be extracted");
        };
        assert_eq!(entry.title, "Intro to Ownership");
        assert_eq!(entry.url, "https://www.youtube.com/watch?v=abc&list=PL1");
        assert_eq!(entry.channel, "Item Channel");
        assert_eq!(entry.thumbnail.as_deref(), Some("https://i.ytimg.com/vi/abc/hq.jpg"));
        assert_eq!(entry.duration.as_deref(), Some("12:34"));
        assert_eq!(entry.views.as_deref(), Some("1.2M views"));
        assert_eq!(entry.upload_time.as_deref(), Some("2 years ago"));
    }

    #[test]
    fn test_degraded_fields() {
        let body = format!(
            r#"{TITLE}{DURATION}<div id="metadata-line"><yt-formatted-string>1.2M views</yt-formatted-string></div>"#
        );
        let ItemOutcome::Extracted(entry) = extract(&body) else {
            panic!("item should be extracted");
        };
        assert_eq!(entry.channel, "Playlist Channel");
        assert_eq!(entry.thumbnail, None);
        assert_eq!(entry.views, None);
        assert_eq!(entry.upload_time, None);
    }

    #[test]
    fn test_duration_fallback_selector() {
        let body = format!(
            r#"{TITLE}<ytd-thumbnail-overlay-time-status-renderer><span id="text">1:00:00</span></ytd-thumbnail-overlay-time-status-renderer>"#
        );
        let ItemOutcome::Extracted(entry) = extract(&body) else {
            panic!("item should be extracted");
        };
        assert_eq!(entry.duration_seconds(), 3600);
    }

    #[test]
    fn test_skips() {
        assert_eq!(extract(DURATION), ItemOutcome::Skipped(SkipReason::MissingTitle));
        assert_eq!(extract(TITLE), ItemOutcome::Skipped(SkipReason::MissingDuration));

        let short = format!(
            r#"{TITLE}<ytd-thumbnail-overlay-time-status-renderer><div class="badge-shape-wiz__text">0:59</div></ytd-thumbnail-overlay-time-status-renderer>"#
        );
        assert_eq!(
            extract(&short),
            ItemOutcome::Skipped(SkipReason::TooShort {
                duration: "0:59".to_string(),
                seconds: 59
            })
        );

        let unparseable = format!(
            r#"{TITLE}<ytd-thumbnail-overlay-time-status-renderer><div class="badge-shape-wiz__text">LIVE</div></ytd-thumbnail-overlay-time-status-renderer>"#
        );
        assert!(matches!(
            extract(&unparseable),
            ItemOutcome::Skipped(SkipReason::TooShort { seconds: 0, .. })
        ));
    }
}
