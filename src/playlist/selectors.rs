//! Ordered selector fallback chains; the first selector that yields wins

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::extract::normalize_text;
use crate::browser::{BrowserPage, ElementHandle};
use crate::error::{BrowserError, BrowserResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A priority list of selectors for one field
#[derive(Debug, Clone, Copy)]
pub struct SelectorChain<'a> {
    selectors: &'a [String],
}

impl<'a> SelectorChain<'a> {
    pub fn new(selectors: &'a [String]) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &'a [String] {
        self.selectors
    }

    /// First element matched by any selector, with the selector that matched
    pub fn first_element(
        &self,
        page: &mut dyn BrowserPage,
        scope: Option<ElementHandle>,
    ) -> BrowserResult<Option<(ElementHandle, &'a str)>> {
        for selector in self.selectors {
            match page.query_first(scope, selector) {
                Ok(Some(element)) => return Ok(Some((element, selector.as_str()))),
                Ok(None) => debug!("Selector '{}' matched nothing", selector),
                Err(e) => miss(selector, e)?,
            }
        }
        Ok(None)
    }

    /// Normalised, non-empty text of the first matching element
    pub fn first_text(
        &self,
        page: &mut dyn BrowserPage,
        scope: Option<ElementHandle>,
    ) -> BrowserResult<Option<String>> {
        for selector in self.selectors {
            let element = match page.query_first(scope, selector) {
                Ok(Some(element)) => element,
                Ok(None) => continue,
                Err(e) => {
                    miss(selector, e)?;
                    continue;
                }
            };
            let text = normalize_text(&page.text_content(element)?);
            if !text.is_empty() {
                return Ok(Some(text));
            }
            debug!("Selector '{}' matched an empty element", selector);
        }
        Ok(None)
    }

    /// Non-empty attribute value of the first matching element
    pub fn first_attribute(
        &self,
        page: &mut dyn BrowserPage,
        scope: Option<ElementHandle>,
        name: &str,
    ) -> BrowserResult<Option<String>> {
        for selector in self.selectors {
            let element = match page.query_first(scope, selector) {
                Ok(Some(element)) => element,
                Ok(None) => continue,
                Err(e) => {
                    miss(selector, e)?;
                    continue;
                }
            };
            if let Some(value) = page.attribute(element, name)?.filter(|v| !v.trim().is_empty()) {
                return Ok(Some(value.trim().to_string()));
            }
        }
        Ok(None)
    }

    /// Normalised texts of every element matched by the first selector that matches at all
    pub fn all_texts(
        &self,
        page: &mut dyn BrowserPage,
        scope: Option<ElementHandle>,
    ) -> BrowserResult<Vec<String>> {
        for selector in self.selectors {
            let elements = match page.query_all(scope, selector) {
                Ok(elements) if !elements.is_empty() => elements,
                Ok(_) => continue,
                Err(e) => {
                    miss(selector, e)?;
                    continue;
                }
            };
            return elements
                .into_iter()
                .map(|element| page.text_content(element).map(|text| normalize_text(&text)))
                .collect();
        }
        Ok(Vec::new())
    }

    /// Try each selector in turn, waiting up to `timeout` per selector for a visible match
    pub fn first_visible(
        &self,
        page: &mut dyn BrowserPage,
        timeout: Duration,
    ) -> BrowserResult<Option<(ElementHandle, &'a str)>> {
        for selector in self.selectors {
            debug!("Trying selector: {}", selector);
            match wait_for_visible(page, selector, timeout) {
                Ok(Some(element)) => {
                    debug!("Found visible match with selector: {}", selector);
                    return Ok(Some((element, selector.as_str())));
                }
                Ok(None) => debug!("Selector '{}' produced no visible match within {:?}", selector, timeout),
                Err(e) => miss(selector, e)?,
            }
        }
        Ok(None)
    }
}

/// Poll until `selector` has a visible match or `timeout` elapses; checks at least once
pub fn wait_for_visible(
    page: &mut dyn BrowserPage,
    selector: &str,
    timeout: Duration,
) -> BrowserResult<Option<ElementHandle>> {
    let started = Instant::now();
    loop {
        for element in page.query_all(None, selector)? {
            if page.is_visible(element)? {
                return Ok(Some(element));
            }
        }
        if started.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Selector-level failures count as a miss; session-level failures propagate
fn miss(selector: &str, error: BrowserError) -> BrowserResult<()> {
    match error {
        BrowserError::InvalidSelector { .. } | BrowserError::Timeout { .. } | BrowserError::StaleElement(_) => {
            warn!("Selector '{}' failed: {}", selector, error);
            Ok(())
        }
        other => Err(other),
    }
}
