use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use catalog_sync::logging::init_tracing;
use catalog_sync::util::db::Db;
use catalog_sync::util::env::{init_env, preflight_check};
use catalog_sync::util::http::HttpFetcher;
use catalog_sync::{EtlConfig, MoviePipeline, RunSummary, SteamPipeline, USER_AGENT};

#[derive(Parser, Debug)]
#[command(
    name = "catalog_sync",
    version,
    about = "Sync discounted Steam games and TMDB movies into Postgres"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Steam specials at or above MIN_DISCOUNT, enriched and upserted.
    Steam,
    /// TMDB popular, trending, top-rated and now-playing listings.
    Movies,
    /// Steam then movies, sequentially.
    All,
}

impl Commands {
    fn runs_steam(self) -> bool {
        matches!(self, Commands::Steam | Commands::All)
    }

    fn runs_movies(self) -> bool {
        matches!(self, Commands::Movies | Commands::All)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_env();
    init_tracing("info")?;
    let cli = Cli::parse();
    let command = cli.command;

    preflight_check(
        "catalog_sync",
        &[],
        &[
            "SUPABASE_DB_URL",
            "DATABASE_URL",
            "TMDB_API_KEY",
            "MIN_DISCOUNT",
            "STEAM_DETAIL_DELAY_MS",
            "TMDB_DELAY_MS",
            "HTTP_TIMEOUT_SECS",
            "TMDB_POPULAR_PAGES",
        ],
    )?;
    let config = EtlConfig::from_env(command.runs_movies()).context("configuration")?;

    let fetcher = HttpFetcher::new(USER_AGENT).context("building http client")?;
    let db = Db::connect(&config.database_url, config.db_max_conns)
        .await
        .context("connecting to database")?;

    let mut summaries: Vec<RunSummary> = Vec::new();
    if command.runs_steam() {
        summaries.push(SteamPipeline::new(&fetcher, &db, &config.steam).run().await);
    }
    if command.runs_movies() {
        if let Some(movies) = config.movies.as_ref() {
            summaries.push(MoviePipeline::new(&fetcher, &db, movies).run().await);
        }
    }
    db.pool.close().await;

    let failed: Vec<&str> = summaries
        .iter()
        .filter(|s| !s.succeeded())
        .map(|s| s.pipeline)
        .collect();
    if !failed.is_empty() {
        error!(pipelines = ?failed, "run finished with failures");
        bail!("pipelines did not complete: {}", failed.join(", "));
    }
    info!(runs = summaries.len(), "all pipelines completed");
    Ok(())
}
