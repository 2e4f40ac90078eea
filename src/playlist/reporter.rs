//! Progress reporting injected into a scrape run

use std::sync::Mutex;
use tracing::{debug, info};

use crate::models::{PlaylistInfo, VideoEntry};

/// Page-interaction stages reported as they start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Navigating,
    LocatingPlaylist,
    OpeningPlaylist,
    WaitingForList,
    Scrolling,
    Extracting,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Navigating => "navigating to search results",
            Stage::LocatingPlaylist => "locating first playlist",
            Stage::OpeningPlaylist => "opening playlist",
            Stage::WaitingForList => "waiting for video list",
            Stage::Scrolling => "scrolling to load all items",
            Stage::Extracting => "extracting items",
        }
    }
}

/// Receives progress from a scrape run. All methods default to no-ops.
pub trait ScrapeReporter: Send + Sync {
    fn stage(&self, _stage: Stage) {}

    fn playlist_found(&self, _info: &PlaylistInfo) {}

    fn item_kept(&self, _index: usize, _entry: &VideoEntry) {}

    fn item_skipped(&self, _index: usize, _reason: &str) {}

    fn finished(&self, _kept: usize, _total: usize) {}
}

/// Reports progress as tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ScrapeReporter for TracingReporter {
    fn stage(&self, stage: Stage) {
        info!("▶️  {}", stage.label());
    }

    fn playlist_found(&self, info: &PlaylistInfo) {
        info!("📋 Playlist: {} ({})", info.title, info.channel);
    }

    fn item_kept(&self, index: usize, entry: &VideoEntry) {
        debug!("✅ Item {}: {}", index + 1, entry.title);
    }

    fn item_skipped(&self, index: usize, reason: &str) {
        debug!("⏭️  Item {} skipped: {}", index + 1, reason);
    }

    fn finished(&self, kept: usize, total: usize) {
        info!("🎉 Kept {} of {} playlist items", kept, total);
    }
}

/// One recorded reporter call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Stage(Stage),
    PlaylistFound(String),
    Kept(usize),
    Skipped(usize, String),
    Finished { kept: usize, total: usize },
}

/// Collects reporter calls in order
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    fn push(&self, event: ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl ScrapeReporter for RecordingReporter {
    fn stage(&self, stage: Stage) {
        self.push(ReportEvent::Stage(stage));
    }

    fn playlist_found(&self, info: &PlaylistInfo) {
        self.push(ReportEvent::PlaylistFound(info.title.clone()));
    }

    fn item_kept(&self, index: usize, _entry: &VideoEntry) {
        self.push(ReportEvent::Kept(index));
    }

    fn item_skipped(&self, index: usize, reason: &str) {
        self.push(ReportEvent::Skipped(index, reason.to_string()));
    }

    fn finished(&self, kept: usize, total: usize) {
        self.push(ReportEvent::Finished { kept, total });
    }
}
