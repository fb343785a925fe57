//! Pipeline runners. Each run is strictly linear:
//! fetch listing → (abort if empty) → filter → enrich → transform → dedup → load.
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{MovieSettings, SteamSettings};
use crate::database_ops::dedup::dedup_last_wins;
use crate::database_ops::load::{load, CatalogStore};
use crate::database_ops::stage::StageOutcome;
use crate::database_ops::steam::{filter_by_discount, EnrichedGame, SteamAdapter, SteamCandidate};
use crate::database_ops::tmdb::{MovieSource, TmdbAdapter, TmdbMovie};
use crate::normalization::movie::transform_movies;
use crate::normalization::steam::transform_games;
use crate::util::http::JsonFetcher;
use crate::util::pace::Pacer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    /// The listing produced nothing to process; no enrichment or load ran.
    /// Nothing to do is not a failure.
    Aborted,
    /// Rows were submitted but the store reported none written.
    LoadFailed,
}

impl RunStatus {
    /// Short phrase used in the run summary log line.
    pub fn describe(self) -> &'static str {
        match self {
            RunStatus::Running => "still running",
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "ended early: nothing to process",
            RunStatus::LoadFailed => "failed: store wrote no rows",
        }
    }
}

/// Counts and timing for one run. Observational only.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub pipeline: &'static str,
    pub started_at: DateTime<Utc>,
    pub fetched: usize,
    pub filtered: usize,
    pub enriched: usize,
    pub degraded: usize,
    pub unique: usize,
    pub transformed: usize,
    pub skipped: usize,
    pub loaded: u64,
    pub elapsed: Duration,
    pub status: RunStatus,
}

impl RunSummary {
    fn start(pipeline: &'static str) -> Self {
        Self {
            pipeline,
            started_at: Utc::now(),
            fetched: 0,
            filtered: 0,
            enriched: 0,
            degraded: 0,
            unique: 0,
            transformed: 0,
            skipped: 0,
            loaded: 0,
            elapsed: Duration::ZERO,
            status: RunStatus::Running,
        }
    }

    fn abort(mut self, clock: Instant, reason: &str) -> Self {
        error!(pipeline = self.pipeline, reason, "no records to process; exiting pipeline");
        self.status = RunStatus::Aborted;
        self.elapsed = clock.elapsed();
        self.log();
        self
    }

    fn finish(mut self, clock: Instant, loaded: u64) -> Self {
        self.loaded = loaded;
        self.status = if loaded == 0 && self.transformed > 0 {
            RunStatus::LoadFailed
        } else {
            RunStatus::Completed
        };
        self.elapsed = clock.elapsed();
        self.log();
        self
    }

    /// Completed and aborted runs both exit cleanly; only a rejected load fails.
    pub fn succeeded(&self) -> bool {
        matches!(self.status, RunStatus::Completed | RunStatus::Aborted)
    }

    pub fn log(&self) {
        info!(
            pipeline = self.pipeline,
            status = ?self.status,
            fetched = self.fetched,
            filtered = self.filtered,
            enriched = self.enriched,
            degraded = self.degraded,
            unique = self.unique,
            transformed = self.transformed,
            skipped = self.skipped,
            loaded = self.loaded,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "pipeline run {}",
            self.status.describe()
        );
    }
}

/// Steam specials: listing → discount filter → per-app enrichment → load.
pub struct SteamPipeline<'a, F, S> {
    fetcher: &'a F,
    store: &'a S,
    settings: &'a SteamSettings,
}

impl<'a, F, S> SteamPipeline<'a, F, S>
where
    F: JsonFetcher,
    S: CatalogStore,
{
    pub fn new(fetcher: &'a F, store: &'a S, settings: &'a SteamSettings) -> Self {
        Self {
            fetcher,
            store,
            settings,
        }
    }

    pub async fn run(&self) -> RunSummary {
        let clock = Instant::now();
        let mut summary = RunSummary::start("steam");
        info!(min_discount = self.settings.min_discount, "steam: starting deals pipeline");
        let adapter = SteamAdapter::new(self.fetcher, self.settings);

        let listing = match adapter.fetch_specials().await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "steam: failed to fetch discount list");
                StageOutcome::default()
            }
        };
        listing.log_skipped("steam-listing");
        summary.fetched = listing.kept.len();
        summary.skipped += listing.skipped.len();
        if listing.kept.is_empty() {
            return summary.abort(clock, "discount list is empty");
        }

        let candidates = filter_by_discount(listing.kept, self.settings.min_discount);
        summary.filtered = candidates.len();
        info!(
            count = candidates.len(),
            min_discount = self.settings.min_discount,
            "steam: filtered by discount"
        );
        if candidates.is_empty() {
            return summary.abort(clock, "no games meet the discount threshold");
        }

        let enriched = self.enrich_all(&adapter, candidates).await;
        summary.enriched = enriched.len();
        summary.degraded = enriched.iter().filter(|g| g.degraded).count();

        let rows = transform_games(enriched);
        rows.log_skipped("steam-transform");
        summary.transformed = rows.kept.len();
        summary.skipped += rows.skipped.len();

        let loaded = load(self.store, &self.settings.table, rows.kept).await;
        summary.finish(clock, loaded)
    }

    async fn enrich_all(
        &self,
        adapter: &SteamAdapter<'a, F>,
        candidates: Vec<SteamCandidate>,
    ) -> Vec<EnrichedGame> {
        let pacer = Pacer::new(self.settings.detail_delay);
        let total = candidates.len();
        let mut enriched = Vec::with_capacity(total);
        for (idx, candidate) in candidates.into_iter().enumerate() {
            info!(
                position = idx + 1,
                total,
                name = %candidate.name,
                "steam: processing"
            );
            enriched.push(adapter.enrich(candidate).await);
            pacer.after(idx, total).await;
        }
        enriched
    }
}

/// TMDB movies: several listings → dedup by id → transform → load.
pub struct MoviePipeline<'a, F, S> {
    fetcher: &'a F,
    store: &'a S,
    settings: &'a MovieSettings,
}

impl<'a, F, S> MoviePipeline<'a, F, S>
where
    F: JsonFetcher,
    S: CatalogStore,
{
    pub fn new(fetcher: &'a F, store: &'a S, settings: &'a MovieSettings) -> Self {
        Self {
            fetcher,
            store,
            settings,
        }
    }

    pub async fn run(&self) -> RunSummary {
        let clock = Instant::now();
        let mut summary = RunSummary::start("movies");
        info!("movies: starting TMDB pipeline");

        let listed = self.fetch_all(&mut summary).await;
        summary.fetched = listed.len();
        if listed.is_empty() {
            return summary.abort(clock, "all movie listings are empty");
        }
        summary.filtered = listed.len();

        let unique = dedup_last_wins(listed, |m| m.id.clone());
        summary.unique = unique.len();
        info!(count = unique.len(), "movies: total unique movies");

        let rows = transform_movies(unique);
        rows.log_skipped("movies-transform");
        summary.transformed = rows.kept.len();
        summary.skipped += rows.skipped.len();
        info!(count = rows.kept.len(), "movies: transformed");

        let loaded = load(self.store, &self.settings.table, rows.kept).await;
        summary.finish(clock, loaded)
    }

    async fn fetch_all(&self, summary: &mut RunSummary) -> Vec<TmdbMovie> {
        let adapter = TmdbAdapter::new(self.fetcher, self.settings);
        let pacer = Pacer::new(self.settings.delay);
        let plan = MovieSource::plan(&self.settings.popular_pages);
        let mut all = Vec::new();
        for (idx, source) in plan.iter().enumerate() {
            match adapter.fetch_listing(*source).await {
                Ok(outcome) => {
                    outcome.log_skipped("movies-listing");
                    summary.skipped += outcome.skipped.len();
                    all.extend(outcome.kept);
                }
                Err(err) => {
                    warn!(source = %source, error = %err, "movies: listing failed; continuing");
                }
            }
            pacer.after(idx, plan.len()).await;
        }
        all
    }
}
