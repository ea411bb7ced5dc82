//! Catalog wire models and their mapping to API-facing summaries.

use moodreel_core::GenreId;
use serde::{Deserialize, Serialize};

/// Poster image base (w500 rendition), per the catalog's CDN layout.
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

// Fallbacks for catalog entries with absent fields.
const FALLBACK_TITLE: &str = "Unknown";
const FALLBACK_OVERVIEW: &str = "No description available";
const FALLBACK_RATING: f32 = 7.0;
const FALLBACK_RELEASE_DATE: &str = "2023-01-01";

/// One recommended title, as returned to API callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub title: String,
    pub overview: String,
    pub rating: f32,
    pub release_date: String,
    pub poster_url: Option<String>,
    /// The genre id that sourced this entry.
    pub genres: Vec<GenreId>,
}

/// Raw discover-endpoint payload.
#[derive(Debug, Deserialize)]
pub(crate) struct DiscoverResponse {
    #[serde(default)]
    pub results: Vec<CatalogMovie>,
}

/// One raw catalog entry; absent fields take the documented fallbacks.
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogMovie {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f32>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
}

impl CatalogMovie {
    pub(crate) fn into_summary(self, genre: GenreId) -> MovieSummary {
        MovieSummary {
            title: self.title.unwrap_or_else(|| FALLBACK_TITLE.to_string()),
            overview: self
                .overview
                .unwrap_or_else(|| FALLBACK_OVERVIEW.to_string()),
            rating: self.vote_average.unwrap_or(FALLBACK_RATING),
            release_date: self
                .release_date
                .unwrap_or_else(|| FALLBACK_RELEASE_DATE.to_string()),
            poster_url: self
                .poster_path
                .filter(|path| !path.is_empty())
                .map(|path| format!("{POSTER_BASE_URL}{path}")),
            genres: vec![genre],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_entry_maps_through() {
        let raw: CatalogMovie = serde_json::from_str(
            r#"{
                "title": "Arrival",
                "overview": "A linguist is recruited.",
                "vote_average": 7.6,
                "release_date": "2016-11-10",
                "poster_path": "/abc.jpg"
            }"#,
        )
        .unwrap();
        let summary = raw.into_summary(GenreId(878));
        assert_eq!(summary.title, "Arrival");
        assert_eq!(summary.rating, 7.6);
        assert_eq!(
            summary.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(summary.genres, vec![GenreId(878)]);
    }

    #[test]
    fn test_absent_fields_take_fallbacks() {
        let raw: CatalogMovie = serde_json::from_str("{}").unwrap();
        let summary = raw.into_summary(GenreId(35));
        assert_eq!(summary.title, "Unknown");
        assert_eq!(summary.overview, "No description available");
        assert_eq!(summary.rating, 7.0);
        assert_eq!(summary.release_date, "2023-01-01");
        assert!(summary.poster_url.is_none());
    }

    #[test]
    fn test_empty_poster_path_becomes_none() {
        let raw: CatalogMovie =
            serde_json::from_str(r#"{"title": "x", "poster_path": ""}"#).unwrap();
        assert!(raw.into_summary(GenreId(18)).poster_url.is_none());
    }

    #[test]
    fn test_discover_response_missing_results() {
        let payload: DiscoverResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.results.is_empty());
    }

    #[test]
    fn test_discover_response_parses_results() {
        let payload: DiscoverResponse = serde_json::from_str(
            r#"{"page": 1, "results": [{"title": "a"}, {"title": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.results.len(), 2);
    }
}
