//! Search URL composition for a course name

use crate::config::SearchConfig;
use crate::error::{Result, ScrapeError};

/// A validated course lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    course_name: String,
}

impl SearchQuery {
    /// Create a query from free text; surrounding whitespace is dropped
    pub fn new(course_name: &str) -> Result<Self> {
        let course_name = course_name.trim();
        if course_name.is_empty() {
            return Err(ScrapeError::EmptyCourseName);
        }
        Ok(Self {
            course_name: course_name.to_string(),
        })
    }

    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    /// Search results URL for this query
    pub fn search_url(&self, config: &SearchConfig) -> String {
        build_search_url(&self.course_name, config)
    }
}

/// Compose the playlist-filtered search URL for a course name.
///
/// The language hint only narrows relevance heuristically; the filter parameter
/// restricts result type to playlists.
pub fn build_search_url(course_name: &str, config: &SearchConfig) -> String {
    let phrase = if config.language_hint.is_empty() {
        course_name.to_string()
    } else {
        format!("{} {}", course_name, config.language_hint)
    };

    format!(
        "{}?search_query={}&sp={}",
        config.base_url,
        urlencoding::encode(&phrase),
        config.playlist_filter
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_shape() {
        let url = build_search_url("Rust programming", &SearchConfig::default());
        assert_eq!(
            url,
            "https://www.youtube.com/results?search_query=Rust%20programming%20in%20English&sp=EgIQAw%253D%253D"
        );
    }

    #[test]
    fn test_search_url_is_deterministic() {
        let config = SearchConfig::default();
        assert_eq!(
            build_search_url("Data Structures & Algorithms", &config),
            build_search_url("Data Structures & Algorithms", &config)
        );
    }

    #[test]
    fn test_special_characters_are_encoded() {
        let url = build_search_url("C++ / Qt #1 ü", &SearchConfig::default());
        assert!(url.contains("C%2B%2B%20%2F%20Qt%20%231%20%C3%BC%20in%20English"));
        assert!(url.ends_with("&sp=EgIQAw%253D%253D"));
    }

    #[test]
    fn test_query_rejects_blank_names() {
        assert!(matches!(SearchQuery::new("   "), Err(ScrapeError::EmptyCourseName)));

        let query = SearchQuery::new("  Linear Algebra ").unwrap();
        assert_eq!(query.course_name(), "Linear Algebra");
        assert!(query
            .search_url(&SearchConfig::default())
            .contains("search_query=Linear%20Algebra%20in%20English"));
    }
}
