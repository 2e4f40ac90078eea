//! Browser automation capability used by the playlist driver
//!
//! The driver only talks to [`BrowserPage`]. Two backends implement it: a live
//! Chrome session over the DevTools protocol and an in-memory snapshot backend
//! that replays captured HTML documents.

pub mod chrome;
pub mod snapshot;

use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::error::BrowserResult;

pub use chrome::{ChromeLauncher, ChromePage};
pub use snapshot::{SnapshotLauncher, SnapshotPage};

/// Opaque reference to an element in the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u32);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Total scrollable height of the document
pub const SCROLL_HEIGHT_SCRIPT: &str = "document.documentElement.scrollHeight";

/// Scroll the window to the current bottom of the document
pub const SCROLL_TO_BOTTOM_SCRIPT: &str =
    "window.scrollTo(0, document.documentElement.scrollHeight)";

/// Scroll the window back to the top
pub const SCROLL_TO_TOP_SCRIPT: &str = "window.scrollTo(0, 0)";

/// One browser page driven sequentially by a single scrape run
pub trait BrowserPage {
    /// Load `url` in the page
    fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Block until the page reports network-idle and DOM-ready; fails with
    /// `LoadTimeout` when it does not
    fn wait_for_load(&mut self) -> BrowserResult<()>;

    /// Wait up to `timeout` for `selector` to match and return the first match
    fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowserResult<ElementHandle>;

    /// All matches of `selector` in document order, optionally inside `scope`
    fn query_all(&mut self, scope: Option<ElementHandle>, selector: &str) -> BrowserResult<Vec<ElementHandle>>;

    /// First match of `selector`, optionally inside `scope`
    fn query_first(&mut self, scope: Option<ElementHandle>, selector: &str) -> BrowserResult<Option<ElementHandle>> {
        Ok(self.query_all(scope, selector)?.into_iter().next())
    }

    fn is_visible(&mut self, element: ElementHandle) -> BrowserResult<bool>;

    /// Text of the element (`innerText` in a live browser)
    fn text_content(&mut self, element: ElementHandle) -> BrowserResult<String>;

    fn attribute(&mut self, element: ElementHandle, name: &str) -> BrowserResult<Option<String>>;

    fn click(&mut self, element: ElementHandle) -> BrowserResult<()>;

    fn scroll_into_view(&mut self, element: ElementHandle) -> BrowserResult<()>;

    /// Evaluate a script expression and return its JSON value
    fn evaluate(&mut self, script: &str) -> BrowserResult<Value>;

    /// Serialized HTML of the current document
    fn content(&mut self) -> BrowserResult<String>;

    /// Release the page and its browser; further calls fail with `Closed`
    fn close(&mut self) -> BrowserResult<()>;
}

/// Creates one fresh page per scrape run
pub trait PageLauncher: Send + Sync {
    fn launch(&self) -> BrowserResult<Box<dyn BrowserPage>>;
}
