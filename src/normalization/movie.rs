use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{query_builder::Separated, Postgres};

use crate::database_ops::load::CatalogRow;
use crate::database_ops::stage::{SkipReason, Skipped, StageOutcome};
use crate::database_ops::tmdb::TmdbMovie;

/// Row shape of the `movies` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRow {
    pub tmdb_id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub release_date: Option<NaiveDate>,
    /// Null rather than 0.0 when TMDB has no votes.
    pub rating: Option<f64>,
    pub vote_count: i32,
    pub popularity: f64,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub genre_ids: Vec<i32>,
    pub adult: bool,
    pub original_language: Option<String>,
}

impl CatalogRow for MovieRow {
    const CONFLICT_KEY: &'static str = "tmdb_id";
    const COLUMNS: &'static [&'static str] = &[
        "tmdb_id",
        "title",
        "original_title",
        "release_date",
        "rating",
        "vote_count",
        "popularity",
        "overview",
        "poster_path",
        "backdrop_path",
        "genre_ids",
        "adult",
        "original_language",
    ];

    fn key(&self) -> &str {
        &self.tmdb_id
    }

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.tmdb_id.clone())
            .push_bind(self.title.clone())
            .push_bind(self.original_title.clone())
            .push_bind(self.release_date)
            .push_bind(self.rating)
            .push_bind(self.vote_count)
            .push_bind(self.popularity)
            .push_bind(self.overview.clone())
            .push_bind(self.poster_path.clone())
            .push_bind(self.backdrop_path.clone())
            .push_bind(self.genre_ids.clone())
            .push_bind(self.adult)
            .push_bind(self.original_language.clone());
    }
}

fn invalid(field: &'static str, value: impl ToString) -> SkipReason {
    SkipReason::Invalid {
        field,
        value: value.to_string(),
    }
}

fn nullable_rating(vote_average: Option<f64>) -> Option<f64> {
    vote_average.filter(|v| *v != 0.0)
}

fn release_date(raw: Option<&str>) -> Result<Option<NaiveDate>, SkipReason> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| invalid("release_date", s)),
    }
}

fn transform(movie: TmdbMovie) -> Result<MovieRow, SkipReason> {
    let vote_count = i32::try_from(movie.vote_count.unwrap_or(0))
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| invalid("vote_count", movie.vote_count.unwrap_or(0)))?;
    let genre_ids = movie
        .genre_ids
        .unwrap_or_default()
        .into_iter()
        .map(|g| i32::try_from(g).map_err(|_| invalid("genre_ids", g)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MovieRow {
        release_date: release_date(movie.release_date.as_deref())?,
        rating: nullable_rating(movie.vote_average),
        popularity: movie.popularity.unwrap_or(0.0),
        vote_count,
        genre_ids,
        adult: movie.adult.unwrap_or(false),
        title: movie.title.unwrap_or_default(),
        tmdb_id: movie.id,
        original_title: movie.original_title,
        overview: movie.overview,
        poster_path: movie.poster_path,
        backdrop_path: movie.backdrop_path,
        original_language: movie.original_language,
    })
}

pub fn transform_movie(movie: TmdbMovie) -> Result<MovieRow, Skipped> {
    let id = movie.id.clone();
    transform(movie).map_err(|reason| Skipped::new(Some(id), reason))
}

pub fn transform_movies(movies: Vec<TmdbMovie>) -> StageOutcome<MovieRow> {
    movies.into_iter().map(transform_movie).collect()
}
