//! Scrape result data model, serialized as the output JSON document

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;

/// Playlist-level information, filled once per run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlaylistInfo {
    pub title: String,
    pub channel: String,
    pub url: String,
}

/// One playlist item that passed the duration filter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoEntry {
    pub title: String,
    pub url: String,
    pub channel: String,
    pub thumbnail: Option<String>,
    pub duration: Option<String>,
    pub views: Option<String>,
    pub upload_time: Option<String>,
}

impl VideoEntry {
    /// Length in seconds, derived from the displayed duration
    pub fn duration_seconds(&self) -> u64 {
        self.duration.as_deref().map(parse_duration).unwrap_or(0)
    }
}

/// Run metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeMetadata {
    pub scraped_at: DateTime<Local>,
    /// Search URL the run started from
    pub url: String,
}

/// Root document written per run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapeResult {
    pub playlist_info: PlaylistInfo,
    pub videos: Vec<VideoEntry>,
    pub metadata: ScrapeMetadata,
}

impl ScrapeResult {
    pub fn new(search_url: String) -> Self {
        Self {
            playlist_info: PlaylistInfo::default(),
            videos: Vec::new(),
            metadata: ScrapeMetadata {
                scraped_at: Local::now(),
                url: search_url,
            },
        }
    }

    /// Sum of all kept video durations in seconds
    pub fn total_duration_seconds(&self) -> u64 {
        self.videos.iter().map(VideoEntry::duration_seconds).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn entry(duration: Option<&str>) -> VideoEntry {
        VideoEntry {
            title: "Lecture 1".to_string(),
            url: "https://www.youtube.com/watch?v=abc&list=PL1".to_string(),
            channel: "MIT OpenCourseWare".to_string(),
            thumbnail: None,
            duration: duration.map(str::to_string),
            views: None,
            upload_time: None,
        }
    }

    #[test]
    fn test_duration_seconds_is_derived() {
        assert_eq!(entry(Some("1:02:03")).duration_seconds(), 3723);
        assert_eq!(entry(None).duration_seconds(), 0);
    }

    #[test]
    fn test_json_shape() {
        let mut result = ScrapeResult::new("https://www.youtube.com/results?search_query=x".to_string());
        result.videos.push(entry(Some("2:10")));
        let json = serde_json::to_value(&result).unwrap();

        let video = &json["videos"][0];
        assert_eq!(video["duration"], "2:10");
        assert!(video["thumbnail"].is_null());
        assert!(video["views"].is_null());
        assert!(video["upload_time"].is_null());
        assert!(video.get("duration_seconds").is_none());

        assert!(json["metadata"]["scraped_at"].is_string());
        assert_eq!(json["metadata"]["url"], "https://www.youtube.com/results?search_query=x");
        assert!(matches!(json["playlist_info"], Value::Object(_)));
    }

    #[test]
    fn test_total_duration() {
        let mut result = ScrapeResult::new(String::new());
        result.videos.push(entry(Some("2:10")));
        result.videos.push(entry(Some("10:03")));
        assert_eq!(result.total_duration_seconds(), 733);
    }
}
