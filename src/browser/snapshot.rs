//! In-memory page backend over captured HTML documents
//!
//! Serves a search-results document until a link is clicked, then the playlist
//! document. Scroll scripts are answered from a scripted height sequence so the
//! whole interaction sequence can be replayed without a browser.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::{
    BrowserPage, ElementHandle, PageLauncher, SCROLL_HEIGHT_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT,
    SCROLL_TO_TOP_SCRIPT,
};
use crate::error::{BrowserError, BrowserResult};

/// File name of the captured search-results page
pub const SEARCH_SNAPSHOT: &str = "search.html";

/// File name of the captured playlist page
pub const PLAYLIST_SNAPSHOT: &str = "playlist.html";

/// Height reported when no sequence is scripted
const DEFAULT_HEIGHT: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Blank,
    Search,
    Playlist,
    Closed,
}

pub struct SnapshotPage {
    search_html: String,
    playlist_html: String,
    stage: Stage,
    document: Option<Html>,
    /// Child-index path from the tree root for every handed out handle
    handles: Vec<Vec<usize>>,
    heights: Vec<u64>,
    height_reads: usize,
    scroll_count: usize,
    into_view_count: usize,
    visited: Vec<String>,
    clicked: Vec<String>,
}

impl SnapshotPage {
    pub fn new(search_html: impl Into<String>, playlist_html: impl Into<String>) -> Self {
        Self {
            search_html: search_html.into(),
            playlist_html: playlist_html.into(),
            stage: Stage::Blank,
            document: None,
            handles: Vec::new(),
            heights: vec![DEFAULT_HEIGHT],
            height_reads: 0,
            scroll_count: 0,
            into_view_count: 0,
            visited: Vec::new(),
            clicked: Vec::new(),
        }
    }

    /// Script the values returned by successive scroll-height reads; the last repeats
    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        if !heights.is_empty() {
            self.heights = heights;
        }
        self
    }

    /// Number of scroll-to-bottom actions performed
    pub fn scroll_count(&self) -> usize {
        self.scroll_count
    }

    /// Successful `scroll_into_view` calls
    pub fn into_view_count(&self) -> usize {
        self.into_view_count
    }

    /// URLs passed to `navigate`, in order
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Link targets of clicked elements, in order
    pub fn clicked(&self) -> &[String] {
        &self.clicked
    }

    pub fn is_closed(&self) -> bool {
        self.stage == Stage::Closed
    }

    fn load(&mut self, stage: Stage) {
        let html = match stage {
            Stage::Search => &self.search_html,
            Stage::Playlist => &self.playlist_html,
            Stage::Blank | Stage::Closed => {
                self.document = None;
                self.handles.clear();
                self.stage = stage;
                return;
            }
        };
        self.document = Some(Html::parse_document(html));
        self.handles.clear();
        self.stage = stage;
    }

    fn document(&self) -> BrowserResult<&Html> {
        if self.stage == Stage::Closed {
            return Err(BrowserError::Closed);
        }
        self.document.as_ref().ok_or_else(|| BrowserError::Protocol("no document loaded".to_string()))
    }

    fn parse_selector(selector: &str) -> BrowserResult<Selector> {
        Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
            selector: selector.to_string(),
            reason: format!("{:?}", e),
        })
    }

    fn resolve<'a>(&self, document: &'a Html, element: ElementHandle) -> BrowserResult<ElementRef<'a>> {
        let path = self
            .handles
            .get(element.0 as usize)
            .ok_or(BrowserError::StaleElement(element.0))?;

        let mut node = document.tree.root();
        for &index in path {
            node = node
                .children()
                .nth(index)
                .ok_or(BrowserError::StaleElement(element.0))?;
        }
        ElementRef::wrap(node).ok_or(BrowserError::StaleElement(element.0))
    }

    fn register(&mut self, path: Vec<usize>) -> ElementHandle {
        self.handles.push(path);
        ElementHandle((self.handles.len() - 1) as u32)
    }

    fn link_target(element: ElementRef<'_>) -> Option<String> {
        if let Some(href) = element.value().attr("href") {
            return Some(href.to_string());
        }
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find_map(|ancestor| ancestor.value().attr("href").map(str::to_string))
    }

    fn is_hidden(element: ElementRef<'_>) -> bool {
        let value = element.value();
        if value.attr("hidden").is_some() {
            return true;
        }
        let style = value.attr("style").unwrap_or_default().replace(' ', "").to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    }
}

/// Child-index path from the tree root down to `element`
fn path_of(element: ElementRef<'_>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = *element;
    while let Some(parent) = node.parent() {
        path.push(node.prev_siblings().count());
        node = parent;
    }
    path.reverse();
    path
}

impl BrowserPage for SnapshotPage {
    fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        if self.stage == Stage::Closed {
            return Err(BrowserError::Closed);
        }
        self.visited.push(url.to_string());
        self.load(Stage::Search);
        debug!("Snapshot navigation to {}", url);
        Ok(())
    }

    fn wait_for_load(&mut self) -> BrowserResult<()> {
        self.document().map(|_| ())
    }

    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<ElementHandle> {
        self.query_first(None, selector)?.ok_or_else(|| BrowserError::Timeout {
            selector: selector.to_string(),
            timeout,
        })
    }

    fn query_all(&mut self, scope: Option<ElementHandle>, selector: &str) -> BrowserResult<Vec<ElementHandle>> {
        let parsed = Self::parse_selector(selector)?;
        let paths: Vec<Vec<usize>> = {
            let document = self.document()?;
            match scope {
                Some(scope) => self.resolve(document, scope)?.select(&parsed).map(path_of).collect(),
                None => document.select(&parsed).map(path_of).collect(),
            }
        };

        Ok(paths.into_iter().map(|path| self.register(path)).collect())
    }

    fn is_visible(&mut self, element: ElementHandle) -> BrowserResult<bool> {
        let document = self.document()?;
        let element = self.resolve(document, element)?;
        let hidden = Self::is_hidden(element)
            || element.ancestors().filter_map(ElementRef::wrap).any(Self::is_hidden);
        Ok(!hidden)
    }

    fn text_content(&mut self, element: ElementHandle) -> BrowserResult<String> {
        let document = self.document()?;
        Ok(self.resolve(document, element)?.text().collect())
    }

    fn attribute(&mut self, element: ElementHandle, name: &str) -> BrowserResult<Option<String>> {
        let document = self.document()?;
        Ok(self
            .resolve(document, element)?
            .value()
            .attr(name)
            .map(str::to_string))
    }

    fn click(&mut self, element: ElementHandle) -> BrowserResult<()> {
        let document = self.document()?;
        let target = Self::link_target(self.resolve(document, element)?);

        if let Some(href) = target {
            self.clicked.push(href);
            if self.stage == Stage::Search {
                self.load(Stage::Playlist);
            }
        }
        Ok(())
    }

    fn scroll_into_view(&mut self, element: ElementHandle) -> BrowserResult<()> {
        let document = self.document()?;
        self.resolve(document, element)?;
        self.into_view_count += 1;
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> BrowserResult<Value> {
        self.document()?;
        match script {
            SCROLL_HEIGHT_SCRIPT => {
                let index = self.height_reads.min(self.heights.len() - 1);
                self.height_reads += 1;
                Ok(Value::from(self.heights[index]))
            }
            SCROLL_TO_BOTTOM_SCRIPT => {
                self.scroll_count += 1;
                Ok(Value::Null)
            }
            SCROLL_TO_TOP_SCRIPT => Ok(Value::Null),
            other => Err(BrowserError::Script(format!(
                "script not supported by snapshot replay: {}",
                other
            ))),
        }
    }

    fn content(&mut self) -> BrowserResult<String> {
        Ok(self.document()?.html())
    }

    fn close(&mut self) -> BrowserResult<()> {
        self.load(Stage::Closed);
        Ok(())
    }
}

/// Launches snapshot pages from in-memory documents or a capture directory
#[derive(Debug, Clone)]
pub struct SnapshotLauncher {
    search_html: String,
    playlist_html: String,
    heights: Vec<u64>,
}

impl SnapshotLauncher {
    pub fn new(search_html: impl Into<String>, playlist_html: impl Into<String>) -> Self {
        Self {
            search_html: search_html.into(),
            playlist_html: playlist_html.into(),
            heights: Vec::new(),
        }
    }

    /// Read `search.html` and `playlist.html` written by a capture run
    pub fn from_dir(dir: &Path) -> std::io::Result<Self> {
        let search_html = std::fs::read_to_string(dir.join(SEARCH_SNAPSHOT))?;
        let playlist_html = std::fs::read_to_string(dir.join(PLAYLIST_SNAPSHOT))?;
        Ok(Self::new(search_html, playlist_html))
    }

    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights;
        self
    }
}

impl PageLauncher for SnapshotLauncher {
    fn launch(&self) -> BrowserResult<Box<dyn BrowserPage>> {
        Ok(Box::new(
            SnapshotPage::new(self.search_html.clone(), self.playlist_html.clone())
                .with_heights(self.heights.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH: &str = r#"<html><body>
        <ytd-item-section-renderer>
            <a id="hidden-link" href="/watch?v=x" style="display: none">Hidden</a>
            <a id="video-title" href="/playlist?list=PL123">  Rust Course  </a>
        </ytd-item-section-renderer>
    </body></html>"#;

    const PLAYLIST: &str = r#"<html><body>
        <div id="contents">
            <ytd-playlist-video-renderer><span class="t">One</span></ytd-playlist-video-renderer>
            <ytd-playlist-video-renderer><span class="t">Two</span></ytd-playlist-video-renderer>
        </div>
    </body></html>"#;

    #[test]
    fn test_query_and_read() {
        let mut page = SnapshotPage::new(SEARCH, PLAYLIST);
        page.navigate("https://example.test/results").unwrap();

        let link = page
            .wait_for_selector("ytd-item-section-renderer a#video-title", Duration::from_secs(5))
            .unwrap();
        assert_eq!(page.text_content(link).unwrap().trim(), "Rust Course");
        assert_eq!(
            page.attribute(link, "href").unwrap().as_deref(),
            Some("/playlist?list=PL123")
        );
        assert!(page.is_visible(link).unwrap());

        let hidden = page.query_first(None, "#hidden-link").unwrap().unwrap();
        assert!(!page.is_visible(hidden).unwrap());
    }

    #[test]
    fn test_click_switches_to_playlist_document() {
        let mut page = SnapshotPage::new(SEARCH, PLAYLIST);
        page.navigate("https://example.test/results").unwrap();
        let link = page.query_first(None, "a#video-title").unwrap().unwrap();
        page.click(link).unwrap();

        assert_eq!(page.clicked(), ["/playlist?list=PL123".to_string()]);
        let items = page.query_all(None, "#contents ytd-playlist-video-renderer").unwrap();
        assert_eq!(items.len(), 2);

        let title = page.query_first(Some(items[1]), ".t").unwrap().unwrap();
        assert_eq!(page.text_content(title).unwrap(), "Two");

        // Handles from the search document do not survive the switch
        assert!(matches!(page.text_content(link), Err(BrowserError::StaleElement(_))));
    }

    #[test]
    fn test_missing_selector_times_out() {
        let mut page = SnapshotPage::new(SEARCH, PLAYLIST);
        page.navigate("https://example.test/results").unwrap();
        let err = page.wait_for_selector("#nothing", Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, BrowserError::Timeout { .. }));
    }

    #[test]
    fn test_invalid_selector_is_reported() {
        let mut page = SnapshotPage::new(SEARCH, PLAYLIST);
        page.navigate("https://example.test/results").unwrap();
        let err = page.query_all(None, "a[href*=").unwrap_err();
        assert!(matches!(err, BrowserError::InvalidSelector { .. }));
    }

    #[test]
    fn test_scripted_heights_and_close() {
        let mut page = SnapshotPage::new(SEARCH, PLAYLIST).with_heights(vec![1000, 2000]);
        page.navigate("https://example.test/results").unwrap();

        assert_eq!(page.evaluate(SCROLL_HEIGHT_SCRIPT).unwrap(), Value::from(1000u64));
        page.evaluate(SCROLL_TO_BOTTOM_SCRIPT).unwrap();
        assert_eq!(page.evaluate(SCROLL_HEIGHT_SCRIPT).unwrap(), Value::from(2000u64));
        assert_eq!(page.evaluate(SCROLL_HEIGHT_SCRIPT).unwrap(), Value::from(2000u64));
        assert_eq!(page.scroll_count(), 1);
        assert!(page.evaluate("alert(1)").is_err());

        page.close().unwrap();
        assert!(page.is_closed());
        assert!(matches!(page.content(), Err(BrowserError::Closed)));
    }
}
