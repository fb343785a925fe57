use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::config::MovieSettings;
use crate::database_ops::source::{ParseError, SourceError};
use crate::database_ops::stage::{SkipReason, Skipped, StageOutcome};
use crate::normalization::de_external_id;
use crate::util::http::JsonFetcher;

/// One TMDB listing endpoint (and page, where paged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieSource {
    Popular { page: u32 },
    TrendingWeek,
    TopRated { page: u32 },
    NowPlaying { page: u32 },
}

impl MovieSource {
    /// Calls made per run, in concatenation order (later entries win dedup).
    pub fn plan(popular_pages: &[u32]) -> Vec<MovieSource> {
        let mut plan: Vec<MovieSource> = popular_pages
            .iter()
            .map(|&page| MovieSource::Popular { page })
            .collect();
        plan.push(MovieSource::TrendingWeek);
        plan.push(MovieSource::TopRated { page: 1 });
        plan.push(MovieSource::NowPlaying { page: 1 });
        plan
    }

    pub fn path(&self) -> &'static str {
        match self {
            MovieSource::Popular { .. } => "/movie/popular",
            MovieSource::TrendingWeek => "/trending/movie/week",
            MovieSource::TopRated { .. } => "/movie/top_rated",
            MovieSource::NowPlaying { .. } => "/movie/now_playing",
        }
    }

    pub fn page(&self) -> Option<u32> {
        match *self {
            MovieSource::Popular { page }
            | MovieSource::TopRated { page }
            | MovieSource::NowPlaying { page } => Some(page),
            MovieSource::TrendingWeek => None,
        }
    }
}

impl fmt::Display for MovieSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieSource::Popular { page } => write!(f, "popular (page {page})"),
            MovieSource::TrendingWeek => write!(f, "trending"),
            MovieSource::TopRated { page } => write!(f, "top-rated (page {page})"),
            MovieSource::NowPlaying { page } => write!(f, "now-playing (page {page})"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

/// One movie object from a listing `results` array.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TmdbMovie {
    #[serde(deserialize_with = "de_external_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub vote_count: Option<i64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub adult: Option<bool>,
    #[serde(default)]
    pub original_language: Option<String>,
}

impl TmdbMovie {
    fn from_result(raw: Value) -> Result<Self, Skipped> {
        let hint = raw.get("id").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        serde_json::from_value(raw).map_err(|e| Skipped::new(hint, SkipReason::Schema(e.to_string())))
    }
}

/// Parse a listing page into movies, isolating malformed results.
pub fn parse_listing(body: Value) -> Result<StageOutcome<TmdbMovie>, ParseError> {
    let page: ListingPage = serde_json::from_value(body)?;
    Ok(page
        .results
        .unwrap_or_default()
        .into_iter()
        .map(TmdbMovie::from_result)
        .collect())
}

pub struct TmdbAdapter<'a, F> {
    fetcher: &'a F,
    settings: &'a MovieSettings,
}

impl<'a, F: JsonFetcher> TmdbAdapter<'a, F> {
    pub fn new(fetcher: &'a F, settings: &'a MovieSettings) -> Self {
        Self { fetcher, settings }
    }

    pub async fn fetch_listing(
        &self,
        source: MovieSource,
    ) -> Result<StageOutcome<TmdbMovie>, SourceError> {
        info!(source = %source, "movies: fetching listing");
        let url = format!("{}{}", self.settings.base_url, source.path());
        let mut query = vec![
            ("api_key", self.settings.api_key.clone()),
            ("language", self.settings.language.clone()),
        ];
        if let Some(page) = source.page() {
            query.push(("page", page.to_string()));
        }
        let body = self
            .fetcher
            .fetch(&url, &query, self.settings.timeout)
            .await?;
        let outcome = parse_listing(body)?;
        info!(
            source = %source,
            count = outcome.kept.len(),
            skipped = outcome.skipped.len(),
            "movies: fetched listing"
        );
        Ok(outcome)
    }
}
