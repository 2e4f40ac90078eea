//! Scroll-until-stable loading of lazily rendered playlist items

use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::{BrowserPage, SCROLL_HEIGHT_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT, SCROLL_TO_TOP_SCRIPT};
use crate::config::TimingConfig;
use crate::error::{BrowserError, BrowserResult};

/// How the scroll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    /// Height stopped growing after `scrolls` scroll actions
    Stable { scrolls: usize, height: u64 },
    /// The attempt cap was hit while the page was still growing
    CapReached { scrolls: usize, height: u64 },
}

impl ScrollOutcome {
    pub fn scrolls(&self) -> usize {
        match self {
            ScrollOutcome::Stable { scrolls, .. } | ScrollOutcome::CapReached { scrolls, .. } => *scrolls,
        }
    }
}

fn scroll_height(page: &mut dyn BrowserPage) -> BrowserResult<u64> {
    let value = page.evaluate(SCROLL_HEIGHT_SCRIPT)?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .ok_or_else(|| BrowserError::Script(format!("unexpected scroll height {}", n))),
        other => Err(BrowserError::Script(format!("unexpected scroll height {}", other))),
    }
}

/// Scroll to the bottom until the document height stops increasing, then return to the top
pub fn scroll_until_stable(page: &mut dyn BrowserPage, timing: &TimingConfig) -> BrowserResult<ScrollOutcome> {
    let mut last_height = scroll_height(page)?;
    let mut scrolls = 0;

    let outcome = loop {
        if scrolls >= timing.max_scroll_attempts {
            warn!(
                "Stopped scrolling after {} attempts; page height still {} and growing",
                scrolls, last_height
            );
            break ScrollOutcome::CapReached { scrolls, height: last_height };
        }

        page.evaluate(SCROLL_TO_BOTTOM_SCRIPT)?;
        scrolls += 1;
        std::thread::sleep(timing.scroll_pause());

        let new_height = scroll_height(page)?;
        if new_height <= last_height {
            break ScrollOutcome::Stable { scrolls, height: new_height };
        }

        last_height = new_height;
        debug!("Scrolled to height: {}", new_height);
    };

    page.evaluate(SCROLL_TO_TOP_SCRIPT)?;
    std::thread::sleep(timing.top_pause());

    Ok(outcome)
}
