use serde::Serialize;
use sqlx::{query_builder::Separated, Postgres};

use crate::database_ops::load::CatalogRow;
use crate::database_ops::stage::{SkipReason, Skipped, StageOutcome};
use crate::database_ops::steam::EnrichedGame;

/// Row shape of the `steam_deals` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SteamDealRow {
    pub app_id: String,
    pub name: String,
    pub original_price: f64,
    pub final_price: f64,
    pub discount_percent: i32,
    pub steam_deck_compatible: bool,
    pub metacritic_score: Option<i32>,
    pub header_image: String,
}

impl CatalogRow for SteamDealRow {
    const CONFLICT_KEY: &'static str = "app_id";
    const COLUMNS: &'static [&'static str] = &[
        "app_id",
        "name",
        "original_price",
        "final_price",
        "discount_percent",
        "steam_deck_compatible",
        "metacritic_score",
        "header_image",
    ];

    fn key(&self) -> &str {
        &self.app_id
    }

    fn push_binds<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        row.push_bind(self.app_id.clone())
            .push_bind(self.name.clone())
            .push_bind(self.original_price)
            .push_bind(self.final_price)
            .push_bind(self.discount_percent)
            .push_bind(self.steam_deck_compatible)
            .push_bind(self.metacritic_score)
            .push_bind(self.header_image.clone());
    }
}

fn percent(field: &'static str, value: i64) -> Result<i32, SkipReason> {
    i32::try_from(value)
        .ok()
        .filter(|v| (0..=100).contains(v))
        .ok_or(SkipReason::Invalid {
            field,
            value: value.to_string(),
        })
}

pub fn transform_game(game: EnrichedGame) -> Result<SteamDealRow, Skipped> {
    let EnrichedGame {
        candidate,
        steam_deck_compatible,
        metacritic_score,
        ..
    } = game;
    let skip = |reason| Skipped::new(Some(candidate.app_id.clone()), reason);

    let discount_percent = percent("discount_percent", candidate.discount_percent).map_err(skip)?;
    let metacritic_score = metacritic_score
        .map(|s| percent("metacritic_score", s))
        .transpose()
        .map_err(skip)?;
    for (field, value) in [
        ("original_price", candidate.original_price),
        ("final_price", candidate.final_price),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(skip(SkipReason::Invalid {
                field,
                value: value.to_string(),
            }));
        }
    }

    Ok(SteamDealRow {
        app_id: candidate.app_id,
        name: candidate.name,
        original_price: candidate.original_price,
        final_price: candidate.final_price,
        discount_percent,
        steam_deck_compatible,
        metacritic_score,
        header_image: candidate.header_image,
    })
}

pub fn transform_games(games: Vec<EnrichedGame>) -> StageOutcome<SteamDealRow> {
    games.into_iter().map(transform_game).collect()
}
