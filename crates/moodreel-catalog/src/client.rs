//! HTTP client for the movie catalog service.
//!
//! Discovery is the recommendation path: one keyed GET per genre id, capped
//! per call and overall, with per-genre failures skipped so a partial
//! catalog outage still yields whatever was gathered.

use crate::models::{CatalogMovie, DiscoverResponse, MovieSummary};
use moodreel_core::GenreId;
use std::time::Duration;
use thiserror::Error;

/// Production catalog endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const RESULTS_PER_GENRE: usize = 5;
const MAX_RECOMMENDATIONS: usize = 10;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Bearer-authenticated catalog client. Cheap to share behind an `Arc`.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl CatalogClient {
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
        })
    }

    /// Most popular titles for one genre, capped at 5.
    pub async fn discover_by_genre(
        &self,
        genre: GenreId,
    ) -> Result<Vec<MovieSummary>, CatalogError> {
        let response = self
            .http
            .get(format!("{}/discover/movie", self.base_url))
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("with_genres", genre.0.to_string()),
                ("sort_by", "popularity.desc".to_string()),
                ("page", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        let payload: DiscoverResponse = response.json().await?;
        Ok(summarize_batch(payload.results, genre))
    }

    /// One discover call per genre id; per-genre errors are logged and
    /// skipped, so catalog trouble never fails the caller's response.
    pub async fn recommendations_for(&self, genres: &[GenreId]) -> Vec<MovieSummary> {
        let mut movies = Vec::new();
        for &genre in genres {
            match self.discover_by_genre(genre).await {
                Ok(batch) => {
                    tracing::info!(genre = genre.0, count = batch.len(), "catalog batch fetched");
                    movies.extend(batch);
                }
                Err(err) => {
                    tracing::warn!(genre = genre.0, error = %err, "catalog lookup failed; skipping genre");
                }
            }
        }
        movies.truncate(MAX_RECOMMENDATIONS);
        movies
    }

    /// Free-text search across movies and TV shows. Raw payload passthrough.
    pub async fn search_multi(&self, query: &str) -> Result<serde_json::Value, CatalogError> {
        self.get_json(&format!("{}/search/multi", self.base_url), &[("query", query)])
            .await
    }

    /// Trending titles for a media type and time window. Raw payload
    /// passthrough.
    pub async fn trending(
        &self,
        media_type: &str,
        time_window: &str,
    ) -> Result<serde_json::Value, CatalogError> {
        self.get_json(
            &format!("{}/trending/{media_type}/{time_window}", self.base_url),
            &[],
        )
        .await
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, CatalogError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        Ok(response.json().await?)
    }
}

/// Map and cap one genre's raw results.
fn summarize_batch(results: Vec<CatalogMovie>, genre: GenreId) -> Vec<MovieSummary> {
    results
        .into_iter()
        .take(RESULTS_PER_GENRE)
        .map(|movie| movie.into_summary(genre))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_movie(title: &str) -> CatalogMovie {
        serde_json::from_value(serde_json::json!({ "title": title })).unwrap()
    }

    #[test]
    fn test_batch_capped_at_five() {
        let results: Vec<CatalogMovie> = (0..8).map(|i| raw_movie(&format!("m{i}"))).collect();
        let batch = summarize_batch(results, GenreId(28));
        assert_eq!(batch.len(), RESULTS_PER_GENRE);
        assert_eq!(batch[0].title, "m0");
    }

    #[test]
    fn test_batch_smaller_than_cap() {
        let results = vec![raw_movie("only")];
        assert_eq!(summarize_batch(results, GenreId(28)).len(), 1);
    }

    #[test]
    fn test_batch_tags_source_genre() {
        let batch = summarize_batch(vec![raw_movie("x")], GenreId(9648));
        assert_eq!(batch[0].genres, vec![GenreId(9648)]);
    }
}
