//! Hit the live Steam endpoints once and print what the pipeline would see.
//! Never touches the database.
use anyhow::{Context, Result};
use clap::Parser;

use catalog_sync::config::SteamSettings;
use catalog_sync::database_ops::steam::{deck_compatible, filter_by_discount, SteamAdapter};
use catalog_sync::logging::init_tracing;
use catalog_sync::util::env::{env_opt, init_env};
use catalog_sync::util::http::HttpFetcher;
use catalog_sync::USER_AGENT;

#[derive(Parser, Debug)]
#[command(name = "steam_probe", about = "Inspect Steam specials and appdetails")]
struct Args {
    /// App to fetch details for.
    #[arg(long, default_value = "1091500")]
    app_id: String,
    /// How many specials to print.
    #[arg(long, default_value_t = 5)]
    sample: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_env();
    init_tracing("warn")?;
    let args = Args::parse();

    let settings = SteamSettings::from_lookup(&env_opt).context("steam settings")?;
    let fetcher = HttpFetcher::new(USER_AGENT)?;
    let adapter = SteamAdapter::new(&fetcher, &settings);

    let listing = adapter.fetch_specials().await?;
    let eligible = filter_by_discount(listing.kept.clone(), settings.min_discount);
    println!(
        "[steam_probe] specials={} skipped={} at_or_above_{}%={}",
        listing.kept.len(),
        listing.skipped.len(),
        settings.min_discount,
        eligible.len()
    );
    for c in listing.kept.iter().take(args.sample) {
        println!(
            "  {} | {} | {}% | {:.2} -> {:.2}",
            c.app_id, c.name, c.discount_percent, c.original_price, c.final_price
        );
    }

    let details = adapter.fetch_app_details(&args.app_id).await?;
    let categories: Vec<i64> = details.category_ids().collect();
    println!("[steam_probe] appdetails {}", args.app_id);
    println!("  categories: {:?}", categories);
    println!("  linux: {}", details.linux());
    println!("  metacritic: {:?}", details.metacritic_score());
    println!(
        "  deck_compatible (heuristic): {}",
        deck_compatible(categories.iter().copied(), details.linux())
    );
    Ok(())
}
